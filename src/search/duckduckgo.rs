//! Keyless fallback over the DuckDuckGo HTML endpoint.
//!
//! The endpoint cannot exclude domains, so every call fetches an oversampled
//! raw pool and runs it through the block list locally.

use super::{filter_trusted, FallbackSearch, ProviderError};
use crate::trust::BlockList;
use crate::types::SearchResult;
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client};
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DDG_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const NAME: &str = "duckduckgo";
const MIN_POOL: usize = 10;

/// Browser identities cycled per request to keep the endpoint from throttling us.
pub const IDENTITIES: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

pub struct DuckDuckGo {
    http: Client,
    endpoint: String,
    blocklist: Arc<BlockList>,
    next_identity: AtomicUsize,
}

impl DuckDuckGo {
    pub fn new(blocklist: Arc<BlockList>, timeout_ms: u64) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;
        Ok(Self { http, endpoint: DDG_ENDPOINT.to_string(), blocklist, next_identity: AtomicUsize::new(0) })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn identity(&self) -> &'static str {
        let i = self.next_identity.fetch_add(1, Ordering::Relaxed);
        IDENTITIES[i % IDENTITIES.len()]
    }

    /// At least three candidates per wanted result, never fewer than a page.
    pub fn pool_size(limit: usize) -> usize {
        (limit * 3).max(MIN_POOL)
    }

    async fn fetch_pool(&self, query: &str, pool: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let resp = self.http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .header(USER_AGENT, self.identity())
            .send().await
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp.text().await.unwrap_or_default().chars().take(512).collect();
            return Err(ProviderError::Status { provider: NAME, status: status.as_u16(), body });
        }
        let html = resp.text().await
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;
        Ok(parse_results(&html, pool))
    }
}

#[async_trait]
impl FallbackSearch for DuckDuckGo {
    fn name(&self) -> &'static str { NAME }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let raw = self.fetch_pool(query, Self::pool_size(limit)).await?;
        let raw_len = raw.len();
        let kept = filter_trusted(raw, &self.blocklist, limit);
        tracing::debug!(provider = NAME, raw = raw_len, kept = kept.len(), "fallback pool filtered");
        Ok(kept)
    }
}

/// Extract up to `pool` organic results from a result page, in page order.
pub fn parse_results(html: &str, pool: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let (Ok(container), Ok(title), Ok(snippet)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for node in document.select(&container) {
        if out.len() >= pool {
            break;
        }
        if node.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(anchor) = node.select(&title).next() else { continue };
        let Some(url) = anchor.value().attr("href").and_then(resolve_href) else { continue };
        let body = node.select(&snippet).next().map(text_of).unwrap_or_default();
        out.push(SearchResult { title: text_of(anchor), url, snippet: body });
    }
    out
}

fn text_of(elem: ElementRef<'_>) -> String {
    elem.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Result links are usually `//duckduckgo.com/l/?uddg=<target>`; unwrap them.
/// `Url` is only used to read the redirect; the returned string is the target
/// exactly as received, so trust filtering sees the raw URL.
fn resolve_href(href: &str) -> Option<String> {
    let href = href.trim();
    let abs = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };
    let redirect = Url::parse(&abs).ok().filter(|u| {
        u.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) && u.path().starts_with("/l/")
    });
    let target = match redirect {
        Some(u) => u.query_pairs().find(|(k, _)| k == "uddg").map(|(_, v)| v.trim().to_string())?,
        None => abs,
    };
    is_web(&target).then_some(target)
}

fn is_web(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
