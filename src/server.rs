// src/server.rs
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::dialogue::{DialogueError, Orchestrator, Session};
use crate::llm::Llm;
use crate::prompts::SYSTEM_PROMPT;
use crate::retrieve::{render_evidence, EvidenceAggregator};
use crate::types::{ConversationTurn, Provenance, Role};

/// Immutable, shared across requests. Each request owns its own session.
pub struct Engine {
    pub llm: Arc<dyn Llm>,
    pub evidence: Arc<EvidenceAggregator>,
    pub turn_timeout: Duration,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayMessage { pub role: Role, pub content: String }

/// `messages` is what the host displays and must end with the new user claim.
/// `transcript` is the model-facing history returned by the previous turn,
/// tool traffic included; when present it takes precedence over `messages`.
#[derive(Deserialize)]
pub struct ChatReq {
    messages: Vec<DisplayMessage>,
    #[serde(default)]
    transcript: Option<Vec<ConversationTurn>>,
}

#[derive(Serialize)]
pub struct ChatResp {
    reply: String,
    provenance: Vec<Provenance>,
    messages: Vec<DisplayMessage>,
    transcript: Vec<ConversationTurn>,
}

#[derive(Deserialize)]
pub struct EvidenceReq { query: String }

#[derive(Serialize)]
pub struct EvidenceResp { provenance: Provenance, evidence: String }

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg.to_string() })))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Stateless chat turn. The host echoes back the `transcript` it received last
/// time so the model keeps seeing earlier evidence.
pub async fn chat(State(engine): State<Arc<Engine>>, Json(req): Json<ChatReq>) -> Result<Json<ChatResp>, ApiError> {
    let mut messages = req.messages;
    let claim = match messages.pop() {
        Some(DisplayMessage { role: Role::User, content }) => content,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "last message must be a user claim")),
    };
    let history = match req.transcript {
        Some(turns) => turns,
        None => messages.into_iter().map(|m| match m.role {
            Role::User => Ok(ConversationTurn::user(m.content)),
            Role::Assistant => Ok(ConversationTurn::assistant(m.content)),
            Role::ToolResult => Err(api_error(StatusCode::BAD_REQUEST, "tool results belong in `transcript`, not `messages`")),
        }).collect::<Result<Vec<_>, _>>()?,
    };

    let mut session = Session::from_turns(history);
    let orch = Orchestrator::new(engine.llm.as_ref(), engine.evidence.as_ref(), SYSTEM_PROMPT, engine.turn_timeout);
    let report = orch.respond(&mut session, &claim).await.map_err(|e| match e {
        DialogueError::EmptyClaim => api_error(StatusCode::BAD_REQUEST, e),
        DialogueError::TurnTimeout(_) => api_error(StatusCode::GATEWAY_TIMEOUT, e),
        other => api_error(StatusCode::BAD_GATEWAY, other),
    })?;

    Ok(Json(ChatResp {
        reply: report.reply,
        provenance: report.evidence.iter().map(|b| b.provenance()).collect(),
        messages: session.visible().map(|(role, content)| DisplayMessage { role, content: content.to_string() }).collect(),
        transcript: session.turns().to_vec(),
    }))
}

pub async fn evidence(State(engine): State<Arc<Engine>>, Json(req): Json<EvidenceReq>) -> Result<Json<EvidenceResp>, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query is empty"));
    }
    let bundle = engine.evidence.gather(query).await;
    Ok(Json(EvidenceResp { provenance: bundle.provenance(), evidence: render_evidence(&bundle) }))
}

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/evidence", post(evidence))
        .with_state(Arc::new(engine))
}

pub async fn run_server(engine: Engine, addr: &str) -> anyhow::Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
