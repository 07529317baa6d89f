use crate::search::{FallbackSearch, PrimarySearch, ProviderError};
use crate::trust::BlockList;
use crate::types::*;
use std::sync::Arc;

/// Tool output when neither tier produced a trustworthy result.
pub const NO_EVIDENCE: &str =
    "[Evidence source: none]\nNo trustworthy web evidence was found for this query. Say so explicitly and judge the claim on its reasoning alone.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier { Primary, Fallback }

#[derive(Debug)]
enum AttemptOutcome {
    Skipped,
    Found(Vec<SearchResult>),
    Empty,
    Failed(ProviderError),
}

pub struct EvidenceAggregator {
    primary: Option<Arc<dyn PrimarySearch>>,
    fallback: Arc<dyn FallbackSearch>,
    blocklist: Arc<BlockList>,
    limit: usize,
}

impl EvidenceAggregator {
    pub fn new(
        primary: Option<Arc<dyn PrimarySearch>>,
        fallback: Arc<dyn FallbackSearch>,
        blocklist: Arc<BlockList>,
        limit: usize,
    ) -> Self {
        Self { primary, fallback, blocklist, limit: limit.clamp(1, MAX_EVIDENCE) }
    }

    pub fn has_primary(&self) -> bool { self.primary.is_some() }

    async fn attempt(&self, tier: Tier, query: &str) -> AttemptOutcome {
        let res = match tier {
            Tier::Primary => match &self.primary {
                Some(p) => p.search(query, self.limit, &self.blocklist).await,
                None => return AttemptOutcome::Skipped,
            },
            Tier::Fallback => self.fallback.search(query, self.limit).await,
        };
        match res {
            Ok(hits) if hits.is_empty() => AttemptOutcome::Empty,
            Ok(hits) => AttemptOutcome::Found(hits),
            Err(e) => AttemptOutcome::Failed(e),
        }
    }

    /// Primary first, then fallback, strictly in order. Provider failures are
    /// logged and absorbed; the worst case is an empty bundle.
    pub async fn gather(&self, query: &str) -> EvidenceBundle {
        for tier in [Tier::Primary, Tier::Fallback] {
            match self.attempt(tier, query).await {
                AttemptOutcome::Found(hits) => {
                    let provenance = match tier {
                        Tier::Primary => Provenance::Primary,
                        Tier::Fallback => Provenance::Fallback,
                    };
                    tracing::info!(query, ?tier, hits = hits.len(), "evidence gathered");
                    return EvidenceBundle::new(provenance, hits);
                }
                AttemptOutcome::Skipped => tracing::debug!(?tier, "search tier not configured"),
                AttemptOutcome::Empty => tracing::info!(query, ?tier, "search tier returned nothing usable"),
                AttemptOutcome::Failed(e) => tracing::warn!(query, ?tier, error = %e, "search tier failed"),
            }
        }
        EvidenceBundle::empty()
    }

    pub async fn gather_evidence(&self, query: &str) -> String {
        render_evidence(&self.gather(query).await)
    }
}

/// Prompt-ready text: provenance header, then title/link/body per result.
pub fn render_evidence(bundle: &EvidenceBundle) -> String {
    if bundle.is_empty() {
        return NO_EVIDENCE.to_string();
    }
    let body = bundle.results().iter().enumerate()
        .map(|(i, r)| format!("{}. Title: {}\n   Link: {}\n   Body: {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    format!("[Evidence source: {} search]\n{body}", bundle.provenance().label())
}
