pub mod duckduckgo;
pub mod tavily;

use crate::trust::BlockList;
use crate::types::SearchResult;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport { provider: &'static str, #[source] source: reqwest::Error },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },
    #[error("{provider} response could not be decoded: {reason}")]
    Decode { provider: &'static str, reason: String },
}

/// Premium backend that filters domains server-side.
#[async_trait]
pub trait PrimarySearch: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str, limit: usize, excluded: &BlockList) -> Result<Vec<SearchResult>, ProviderError>;
}

/// Free backend; implementations filter results themselves.
#[async_trait]
pub trait FallbackSearch: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ProviderError>;
}

/// Walk `raw` in order, keeping trusted results until `limit` have passed.
pub fn filter_trusted(raw: Vec<SearchResult>, blocklist: &BlockList, limit: usize) -> Vec<SearchResult> {
    raw.into_iter()
        .filter(|r| blocklist.is_trusted(&r.url))
        .take(limit)
        .collect()
}
