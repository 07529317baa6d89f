use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard cap on evidence attached to one tool call, whatever the provider.
pub const MAX_EVIDENCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult { pub title: String, pub url: String, pub snippet: String }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance { Primary, Fallback, None }

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Primary => "Primary",
            Provenance::Fallback => "Fallback",
            Provenance::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceBundle {
    provenance: Provenance,
    results: Vec<SearchResult>,
}

impl EvidenceBundle {
    pub fn new(provenance: Provenance, mut results: Vec<SearchResult>) -> Self {
        results.truncate(MAX_EVIDENCE);
        Self { provenance, results }
    }

    pub fn empty() -> Self {
        Self { provenance: Provenance::None, results: Vec::new() }
    }

    pub fn provenance(&self) -> Provenance { self.provenance }
    pub fn results(&self) -> &[SearchResult] { &self.results }
    pub fn is_empty(&self) -> bool { self.results.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role { User, Assistant, ToolResult }

/// A model-issued request to run a tool. Arguments are kept as flat strings;
/// `tools::ToolCommand` validates them per tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub call_id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationTurn {
    User { content: String },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    ToolResult { call_id: String, name: String, content: String },
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        ConversationTurn::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ConversationTurn::Assistant { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn role(&self) -> Role {
        match self {
            ConversationTurn::User { .. } => Role::User,
            ConversationTurn::Assistant { .. } => Role::Assistant,
            ConversationTurn::ToolResult { .. } => Role::ToolResult,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ConversationTurn::User { content }
            | ConversationTurn::Assistant { content, .. }
            | ConversationTurn::ToolResult { content, .. } => content,
        }
    }

    /// Whether the display surface should render this turn.
    pub fn is_visible(&self) -> bool {
        match self {
            ConversationTurn::User { .. } => true,
            ConversationTurn::Assistant { content, tool_calls } => tool_calls.is_empty() || !content.trim().is_empty(),
            ConversationTurn::ToolResult { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(n: usize) -> SearchResult {
        SearchResult { title: format!("t{n}"), url: format!("https://e.example/{n}"), snippet: format!("s{n}") }
    }

    #[test]
    fn bundle_never_exceeds_cap() {
        let b = EvidenceBundle::new(Provenance::Primary, (0..7).map(hit).collect());
        assert_eq!(b.results().len(), MAX_EVIDENCE);
        assert_eq!(b.results()[0], hit(0));
        assert_eq!(b.results()[2], hit(2));
    }

    #[test]
    fn tool_traffic_is_hidden_from_display() {
        let call = ToolInvocation { call_id: "c1".into(), name: "search_web".into(), arguments: BTreeMap::new() };
        let pending = ConversationTurn::Assistant { content: String::new(), tool_calls: vec![call] };
        let result = ConversationTurn::ToolResult { call_id: "c1".into(), name: "search_web".into(), content: "x".into() };
        assert!(!pending.is_visible());
        assert!(!result.is_visible());
        assert!(ConversationTurn::user("hi").is_visible());
        assert!(ConversationTurn::assistant("hello").is_visible());
    }

    #[test]
    fn turns_serialize_with_role_tag() {
        let v = serde_json::to_value(ConversationTurn::user("claim")).unwrap();
        assert_eq!(v, serde_json::json!({"role": "user", "content": "claim"}));
        let back: ConversationTurn = serde_json::from_value(serde_json::json!({"role": "assistant", "content": "ok"})).unwrap();
        assert_eq!(back, ConversationTurn::assistant("ok"));
    }
}
