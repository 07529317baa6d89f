#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use watson_rs::llm::{ChatRequest, Llm, LlmError, ModelReply};
use watson_rs::search::{FallbackSearch, PrimarySearch, ProviderError};
use watson_rs::trust::BlockList;
use watson_rs::types::{Role, SearchResult, ToolInvocation};

/// Replays canned replies; records the transcript role sequence of every call.
pub struct FakeLlm {
    pub replies: Mutex<VecDeque<Result<ModelReply, LlmError>>>,
    pub calls: AtomicUsize,
    pub seen_roles: Mutex<Vec<Vec<Role>>>,
}

impl FakeLlm {
    pub fn new(replies: Vec<Result<ModelReply, LlmError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0), seen_roles: Mutex::default() }
    }
}

#[async_trait]
impl Llm for FakeLlm {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_roles.lock().unwrap().push(request.transcript.iter().map(|t| t.role()).collect());
        self.replies.lock().unwrap().pop_front().unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub fn search_call(query: &str) -> ModelReply {
    ModelReply::ToolCalls {
        content: None,
        calls: vec![ToolInvocation {
            call_id: "call_0".into(),
            name: "search_web".into(),
            arguments: [("query".to_string(), query.to_string())].into_iter().collect(),
        }],
    }
}

pub struct FakePrimary {
    pub results: Vec<SearchResult>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl PrimarySearch for FakePrimary {
    fn name(&self) -> &'static str { "fake-primary" }
    async fn search(&self, _query: &str, limit: usize, _excluded: &BlockList) -> Result<Vec<SearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Decode { provider: "fake-primary", reason: "boom".into() });
        }
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

pub struct FakeFallback {
    pub results: Vec<SearchResult>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl FallbackSearch for FakeFallback {
    fn name(&self) -> &'static str { "fake-fallback" }
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

pub fn result(url: &str) -> SearchResult {
    SearchResult { title: format!("About {url}"), url: url.into(), snippet: "snippet".into() }
}

pub fn fallback(results: Vec<SearchResult>) -> Arc<FakeFallback> {
    Arc::new(FakeFallback { results, calls: AtomicUsize::new(0) })
}

pub fn primary(results: Vec<SearchResult>, fail: bool) -> Arc<FakePrimary> {
    Arc::new(FakePrimary { results, fail, calls: AtomicUsize::new(0) })
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
