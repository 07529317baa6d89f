use crate::llm::{openai::LlmClient, Llm};
use crate::retrieve::EvidenceAggregator;
use crate::search::{duckduckgo::DuckDuckGo, tavily::Tavily, PrimarySearch};
use crate::trust::BlockList;
use crate::types::MAX_EVIDENCE;
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Runtime settings. Every flag can also come from the environment or a `.env` file.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Azure OpenAI endpoint; when unset an OpenAI-compatible endpoint is used
    #[arg(long, env = "AZURE_OAI_ENDPOINT")] pub azure_endpoint: Option<String>,
    #[arg(long, env = "AZURE_OAI_KEY", hide_env_values = true)] pub azure_key: Option<String>,
    #[arg(long, env = "AZURE_OAI_API_VERSION", default_value = "2024-05-01-preview")] pub azure_api_version: String,
    /// Model name, or deployment name on Azure
    #[arg(long, env = "WATSON_MODEL", default_value = "gpt-4o-mini")] pub model: String,
    #[arg(long, env = "OPENAI_BASE_URL")] pub openai_base_url: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)] pub openai_api_key: Option<String>,
    /// Primary search key; without it only the keyless fallback is used
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)] pub tavily_api_key: Option<String>,
    #[arg(long, env = "WATSON_PRIMARY_QPS", default_value_t = 5)] pub primary_qps: u32,
    #[arg(long, env = "WATSON_EVIDENCE_LIMIT", default_value_t = MAX_EVIDENCE)] pub evidence_limit: usize,
    /// Extra domain substrings to distrust, on top of the built-in list
    #[arg(long = "block-domain", env = "WATSON_BLOCK_DOMAINS", value_delimiter = ',')] pub block_domains: Vec<String>,
    #[arg(long, env = "WATSON_SEARCH_TIMEOUT_MS", default_value_t = 10_000)] pub search_timeout_ms: u64,
    #[arg(long, env = "WATSON_MODEL_TIMEOUT_MS", default_value_t = 60_000)] pub model_timeout_ms: u64,
    #[arg(long, env = "WATSON_TURN_TIMEOUT_MS", default_value_t = 150_000)] pub turn_timeout_ms: u64,
}

impl Settings {
    pub fn block_list(&self) -> BlockList {
        BlockList::with_defaults(self.block_domains.iter().cloned())
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn evidence_aggregator(&self) -> Result<EvidenceAggregator> {
        let blocklist = Arc::new(self.block_list());
        let primary = Tavily::from_key(self.tavily_api_key.clone(), self.primary_qps, self.search_timeout_ms)?
            .map(|t| Arc::new(t) as Arc<dyn PrimarySearch>);
        if primary.is_none() {
            tracing::info!("no primary search key configured; using fallback search only");
        }
        let fallback = Arc::new(DuckDuckGo::new(blocklist.clone(), self.search_timeout_ms)?);
        Ok(EvidenceAggregator::new(primary, fallback, blocklist, self.evidence_limit))
    }

    pub fn llm(&self) -> Arc<dyn Llm> {
        match self.azure_endpoint.clone().filter(|e| !e.trim().is_empty()) {
            Some(endpoint) => {
                tracing::info!(%endpoint, deployment = %self.model, "using Azure OpenAI");
                Arc::new(LlmClient::azure(
                    endpoint,
                    self.azure_key.clone(),
                    self.model.clone(),
                    self.azure_api_version.clone(),
                    self.model_timeout_ms,
                ))
            }
            None => {
                tracing::info!(model = %self.model, "using OpenAI-compatible endpoint");
                Arc::new(LlmClient::openai(
                    self.model.clone(),
                    self.openai_base_url.clone(),
                    self.openai_api_key.clone(),
                    self.model_timeout_ms,
                ))
            }
        }
    }
}
