use crate::llm::{ChatRequest, Llm, LlmError, ModelReply};
use crate::retrieve::{render_evidence, EvidenceAggregator};
use crate::tools::{ToolCommand, ToolError};
use crate::types::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState { AwaitingInput, ToolDecision, ToolExecution, FinalAnswer }

#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("claim is empty")]
    EmptyClaim,
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("model asked for another tool round after evidence was supplied")]
    UnexpectedToolCall,
    #[error("turn did not finish within {0:?}")]
    TurnTimeout(Duration),
}

/// Transcript of one conversation. Owned by whoever drives the chat; never shared.
#[derive(Debug, Clone, Default)]
pub struct Session { turns: Vec<ConversationTurn> }

impl Session {
    pub fn new() -> Self { Self::default() }

    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self { Self { turns } }

    pub fn turns(&self) -> &[ConversationTurn] { &self.turns }

    pub fn len(&self) -> usize { self.turns.len() }

    pub fn is_empty(&self) -> bool { self.turns.is_empty() }

    /// What a chat surface renders: user and assistant text, no tool traffic.
    pub fn visible(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        self.turns.iter().filter(|t| t.is_visible()).map(|t| (t.role(), t.content()))
    }

    fn push(&mut self, turn: ConversationTurn) { self.turns.push(turn); }

    fn truncate(&mut self, len: usize) { self.turns.truncate(len); }
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reply: String,
    pub trace: Vec<DialogueState>,
    pub evidence: Vec<EvidenceBundle>,
}

pub struct Orchestrator<'a> {
    llm: &'a dyn Llm,
    evidence: &'a EvidenceAggregator,
    system_prompt: &'a str,
    turn_timeout: Duration,
}

impl<'a> Orchestrator<'a> {
    pub fn new(llm: &'a dyn Llm, evidence: &'a EvidenceAggregator, system_prompt: &'a str, turn_timeout: Duration) -> Self {
        Self { llm, evidence, system_prompt, turn_timeout }
    }

    /// Run one user turn to completion. On any error the transcript is rolled
    /// back to just after the user's claim, so no unanswered tool call survives.
    pub async fn respond(&self, session: &mut Session, claim: &str) -> Result<TurnReport, DialogueError> {
        let claim = claim.trim();
        if claim.is_empty() {
            return Err(DialogueError::EmptyClaim);
        }
        session.push(ConversationTurn::user(claim));
        let checkpoint = session.len();

        let outcome = tokio::time::timeout(self.turn_timeout, self.run_turn(session)).await;
        let result = match outcome {
            Ok(r) => r,
            Err(_) => Err(DialogueError::TurnTimeout(self.turn_timeout)),
        };
        if let Err(e) = &result {
            tracing::error!(error = %e, "turn aborted");
            session.truncate(checkpoint);
        }
        result
    }

    async fn run_turn(&self, session: &mut Session) -> Result<TurnReport, DialogueError> {
        let mut trace = vec![DialogueState::AwaitingInput, DialogueState::ToolDecision];
        let specs = ToolCommand::specs();
        let decision = self.llm.chat(ChatRequest {
            system: self.system_prompt,
            transcript: session.turns(),
            tools: &specs,
        }).await?;

        let (content, calls) = match decision {
            ModelReply::Text(reply) => {
                trace.push(DialogueState::FinalAnswer);
                session.push(ConversationTurn::assistant(reply.clone()));
                return Ok(TurnReport { reply, trace, evidence: Vec::new() });
            }
            ModelReply::ToolCalls { content, calls } => (content, calls),
        };

        // Validate every call before touching the transcript.
        let commands = calls.iter().map(ToolCommand::try_from).collect::<Result<Vec<_>, _>>()?;
        trace.push(DialogueState::ToolExecution);
        session.push(ConversationTurn::Assistant { content: content.unwrap_or_default(), tool_calls: calls.clone() });

        let mut evidence = Vec::with_capacity(commands.len());
        for (call, command) in calls.into_iter().zip(commands) {
            let output = match command {
                ToolCommand::SearchWeb { query } => {
                    tracing::info!(call_id = %call.call_id, %query, "running web search for claim");
                    let bundle = self.evidence.gather(&query).await;
                    let text = render_evidence(&bundle);
                    evidence.push(bundle);
                    text
                }
            };
            session.push(ConversationTurn::ToolResult { call_id: call.call_id, name: call.name, content: output });
        }

        let answer = self.llm.chat(ChatRequest {
            system: self.system_prompt,
            transcript: session.turns(),
            tools: &[],
        }).await?;
        let reply = match answer {
            ModelReply::Text(reply) => reply,
            ModelReply::ToolCalls { content: Some(reply), .. } => reply,
            ModelReply::ToolCalls { content: None, .. } => return Err(DialogueError::UnexpectedToolCall),
        };
        trace.push(DialogueState::FinalAnswer);
        session.push(ConversationTurn::assistant(reply.clone()));
        Ok(TurnReport { reply, trace, evidence })
    }
}
