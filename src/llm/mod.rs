pub mod openai;

use crate::tools::ToolSpec;
use crate::types::{ConversationTurn, ToolInvocation};

/// One model call: fixed system instruction, the transcript so far, and the
/// tools the model may request (empty means none are offered).
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub transcript: &'a [ConversationTurn],
    pub tools: &'a [ToolSpec],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Text(String),
    ToolCalls { content: Option<String>, calls: Vec<ToolInvocation> },
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model API error: {0}")]
    Api(#[from] async_openai::error::OpenAIError),
    #[error("model call timed out after {0} ms")]
    Timeout(u64),
    #[error("model returned no choices")]
    EmptyResponse,
    #[error("model sent malformed tool arguments for `{tool}`: {reason}")]
    MalformedToolCall { tool: String, reason: String },
    #[error("model backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait Llm: Send + Sync {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply, LlmError>;
}
