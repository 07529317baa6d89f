// src/search/tavily.rs
use super::{PrimarySearch, ProviderError};
use crate::trust::BlockList;
use crate::types::SearchResult;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const NAME: &str = "tavily";
/// Ask for this many times `limit` so the server-side exclusion still leaves enough.
const OVERSAMPLE: usize = 2;

#[derive(Debug, Deserialize)]
struct TavilyItem {
    #[serde(default)] title: String,
    #[serde(default)] url: String,
    #[serde(default)] content: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResp {
    #[serde(default)]
    results: Vec<TavilyItem>,
}

pub struct Tavily {
    http: Client,
    key: String,
    endpoint: String,
    limiter: DefaultDirectRateLimiter,
}

impl Tavily {
    /// `None` when no usable key is configured; the primary tier is then skipped.
    pub fn from_key(key: Option<String>, qps: u32, timeout_ms: u64) -> Result<Option<Self>, ProviderError> {
        match key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            Some(key) => Ok(Some(Self::new(key, qps, timeout_ms)?)),
            None => Ok(None),
        }
    }

    pub fn new(key: String, qps: u32, timeout_ms: u64) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;
        let qps = NonZeroU32::new(qps).unwrap_or(nonzero!(5u32));
        let limiter = RateLimiter::direct(Quota::per_second(qps));
        Ok(Self { http, key, endpoint: TAVILY_ENDPOINT.to_string(), limiter })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl PrimarySearch for Tavily {
    fn name(&self) -> &'static str { NAME }

    async fn search(&self, query: &str, limit: usize, excluded: &BlockList) -> Result<Vec<SearchResult>, ProviderError> {
        self.limiter.until_ready().await;
        let resp = self.http
            .post(&self.endpoint)
            .bearer_auth(&self.key)
            .json(&serde_json::json!({
                "query": query,
                "search_depth": "basic",
                "max_results": limit * OVERSAMPLE,
                "exclude_domains": excluded.domains(),
            }))
            .send().await
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp.text().await.unwrap_or_default().chars().take(512).collect();
            return Err(ProviderError::Status { provider: NAME, status: status.as_u16(), body });
        }
        let parsed = resp.json::<TavilyResp>().await
            .map_err(|e| ProviderError::Decode { provider: NAME, reason: e.to_string() })?;

        tracing::debug!(provider = NAME, raw = parsed.results.len(), "primary search answered");
        Ok(parsed.results.into_iter()
            .filter(|it| !it.url.trim().is_empty())
            .map(|it| SearchResult { title: it.title, url: it.url, snippet: it.content })
            .take(limit)
            .collect())
    }
}
