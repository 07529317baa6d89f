use crate::types::ToolInvocation;
use serde_json::{json, Value};

pub const SEARCH_WEB: &str = "search_web";

/// Schema advertised to the model for one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("model requested unknown tool `{0}`")]
    Unknown(String),
    #[error("tool `{tool}` is missing required argument `{arg}`")]
    MissingArgument { tool: String, arg: &'static str },
}

/// Every tool the assistant can run, with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    SearchWeb { query: String },
}

impl ToolCommand {
    pub fn specs() -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: SEARCH_WEB,
            description: "Search the web for evidence about a factual premise in the user's claim. \
                          Use only when the claim depends on a checkable fact.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query for the factual premise" }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }]
    }
}

impl TryFrom<&ToolInvocation> for ToolCommand {
    type Error = ToolError;

    fn try_from(call: &ToolInvocation) -> Result<Self, Self::Error> {
        match call.name.as_str() {
            SEARCH_WEB => {
                let query = call.arguments.get("query")
                    .map(|q| q.trim())
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| ToolError::MissingArgument { tool: call.name.clone(), arg: "query" })?;
                Ok(ToolCommand::SearchWeb { query: query.to_string() })
            }
            other => Err(ToolError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn call(name: &str, args: &[(&str, &str)]) -> ToolInvocation {
        ToolInvocation {
            call_id: "call_1".into(),
            name: name.into(),
            arguments: args.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn parses_search_with_trimmed_query() {
        let cmd = ToolCommand::try_from(&call(SEARCH_WEB, &[("query", "  moon landing 1969 ")])).unwrap();
        assert_eq!(cmd, ToolCommand::SearchWeb { query: "moon landing 1969".into() });
    }

    #[test]
    fn rejects_unknown_tool_names() {
        let err = ToolCommand::try_from(&call("run_shell", &[("cmd", "ls")])).unwrap_err();
        assert_eq!(err, ToolError::Unknown("run_shell".into()));
    }

    #[test]
    fn rejects_missing_or_blank_query() {
        assert!(matches!(ToolCommand::try_from(&call(SEARCH_WEB, &[])), Err(ToolError::MissingArgument { .. })));
        assert!(matches!(ToolCommand::try_from(&call(SEARCH_WEB, &[("query", "  ")])), Err(ToolError::MissingArgument { .. })));
    }

    #[test]
    fn search_schema_requires_query() {
        let specs = ToolCommand::specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, SEARCH_WEB);
        assert_eq!(specs[0].parameters["required"], json!(["query"]));
    }
}
