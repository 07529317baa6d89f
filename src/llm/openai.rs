use super::{ChatRequest, Llm, LlmError, ModelReply};
use crate::tools::ToolSpec;
use crate::types::{ConversationTurn, ToolInvocation};
use async_openai::{
    config::{AzureConfig, Config, OpenAIConfig},
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
        FunctionObjectArgs,
    },
    Client,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub struct LlmClient<C: Config> {
    client: Client<C>,
    model: String,
    timeout_ms: u64,
}

impl LlmClient<AzureConfig> {
    pub fn azure(endpoint: String, api_key: Option<String>, deployment: String, api_version: String, timeout_ms: u64) -> Self {
        let mut cfg = AzureConfig::new()
            .with_api_base(endpoint)
            .with_deployment_id(deployment.clone())
            .with_api_version(api_version);
        if let Some(key) = api_key { cfg = cfg.with_api_key(key); }
        Self { client: Client::with_config(cfg), model: deployment, timeout_ms }
    }
}

impl LlmClient<OpenAIConfig> {
    pub fn openai(model: String, base_url: Option<String>, api_key: Option<String>, timeout_ms: u64) -> Self {
        let mut cfg = OpenAIConfig::default();
        if let Some(url) = base_url { cfg = cfg.with_api_base(url); }
        if let Some(key) = api_key { cfg = cfg.with_api_key(key); }
        Self { client: Client::with_config(cfg), model, timeout_ms }
    }
}

#[async_trait::async_trait]
impl<C> Llm for LlmClient<C>
where
    C: Config + Send + Sync + 'static,
{
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone()).messages(to_messages(&request)?);
        if !request.tools.is_empty() {
            args.tools(to_tools(request.tools)?).tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let req = args.build()?;

        let started = std::time::Instant::now();
        let resp = tokio::time::timeout(Duration::from_millis(self.timeout_ms), self.client.chat().create(req))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout_ms))??;
        tracing::debug!(model = %self.model, elapsed_ms = started.elapsed().as_millis() as u64, "model call finished");

        let choice = resp.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        parse_reply(choice.message.content, choice.message.tool_calls)
    }
}

pub(crate) fn to_messages(request: &ChatRequest<'_>) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
    let mut out = Vec::with_capacity(request.transcript.len() + 1);
    out.push(ChatCompletionRequestSystemMessageArgs::default().content(request.system).build()?.into());
    for turn in request.transcript {
        let msg: ChatCompletionRequestMessage = match turn {
            ConversationTurn::User { content } => {
                ChatCompletionRequestUserMessageArgs::default().content(content.as_str()).build()?.into()
            }
            ConversationTurn::Assistant { content, tool_calls } => {
                let mut b = ChatCompletionRequestAssistantMessageArgs::default();
                if !content.is_empty() { b.content(content.as_str()); }
                if !tool_calls.is_empty() {
                    b.tool_calls(tool_calls.iter().map(to_wire_call).collect::<Result<Vec<_>, _>>()?);
                }
                b.build()?.into()
            }
            ConversationTurn::ToolResult { call_id, content, .. } => {
                ChatCompletionRequestToolMessageArgs::default()
                    .content(content.as_str())
                    .tool_call_id(call_id.as_str())
                    .build()?
                    .into()
            }
        };
        out.push(msg);
    }
    Ok(out)
}

fn to_wire_call(call: &ToolInvocation) -> Result<ChatCompletionMessageToolCall, LlmError> {
    let arguments = serde_json::to_string(&call.arguments)
        .map_err(|e| LlmError::MalformedToolCall { tool: call.name.clone(), reason: e.to_string() })?;
    Ok(ChatCompletionMessageToolCall {
        id: call.call_id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall { name: call.name.clone(), arguments },
    })
}

fn to_tools(specs: &[ToolSpec]) -> Result<Vec<ChatCompletionTool>, LlmError> {
    specs.iter().map(|s| -> Result<ChatCompletionTool, LlmError> {
        let function = FunctionObjectArgs::default()
            .name(s.name)
            .description(s.description)
            .parameters(s.parameters.clone())
            .build()?;
        Ok(ChatCompletionToolArgs::default().r#type(ChatCompletionToolType::Function).function(function).build()?)
    }).collect()
}

pub(crate) fn parse_reply(
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionMessageToolCall>>,
) -> Result<ModelReply, LlmError> {
    let calls = tool_calls.unwrap_or_default();
    if calls.is_empty() {
        return content
            .filter(|c| !c.trim().is_empty())
            .map(ModelReply::Text)
            .ok_or(LlmError::EmptyResponse);
    }
    let calls = calls.into_iter().map(|c| -> Result<ToolInvocation, LlmError> {
        let arguments = parse_arguments(&c.function.arguments)
            .map_err(|reason| LlmError::MalformedToolCall { tool: c.function.name.clone(), reason })?;
        Ok(ToolInvocation { call_id: c.id, name: c.function.name, arguments })
    }).collect::<Result<Vec<_>, _>>()?;
    Ok(ModelReply::ToolCalls { content: content.filter(|c| !c.trim().is_empty()), calls })
}

/// Flatten a JSON object of arguments to strings; non-string values keep their JSON text.
fn parse_arguments(raw: &str) -> Result<BTreeMap<String, String>, String> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let obj: serde_json::Map<String, Value> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    Ok(obj.into_iter().map(|(k, v)| {
        let v = match v { Value::String(s) => s, other => other.to_string() };
        (k, v)
    }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolCommand, SEARCH_WEB};

    fn wire(id: &str, name: &str, args: &str) -> ChatCompletionMessageToolCall {
        ChatCompletionMessageToolCall {
            id: id.into(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall { name: name.into(), arguments: args.into() },
        }
    }

    #[test]
    fn plain_text_reply() {
        let r = parse_reply(Some("verdict".into()), None).unwrap();
        assert_eq!(r, ModelReply::Text("verdict".into()));
        let r = parse_reply(Some("verdict".into()), Some(vec![])).unwrap();
        assert_eq!(r, ModelReply::Text("verdict".into()));
    }

    #[test]
    fn blank_reply_without_tool_calls_is_an_error() {
        assert!(matches!(parse_reply(None, None), Err(LlmError::EmptyResponse)));
        assert!(matches!(parse_reply(Some("  \n".into()), Some(vec![])), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn tool_call_reply_flattens_arguments() {
        let r = parse_reply(None, Some(vec![wire("c1", SEARCH_WEB, r#"{"query":"boiling point","n":3}"#)])).unwrap();
        let ModelReply::ToolCalls { content, calls } = r else { panic!("expected tool calls") };
        assert!(content.is_none());
        assert_eq!(calls[0].call_id, "c1");
        assert_eq!(calls[0].arguments["query"], "boiling point");
        assert_eq!(calls[0].arguments["n"], "3");
    }

    #[test]
    fn malformed_arguments_are_an_error() {
        let err = parse_reply(None, Some(vec![wire("c1", SEARCH_WEB, "{not json")])).unwrap_err();
        assert!(matches!(err, LlmError::MalformedToolCall { .. }));
    }

    #[test]
    fn transcript_maps_to_wire_messages() {
        let call = ToolInvocation {
            call_id: "c1".into(),
            name: SEARCH_WEB.into(),
            arguments: [("query".to_string(), "q".to_string())].into_iter().collect(),
        };
        let transcript = vec![
            ConversationTurn::user("claim"),
            ConversationTurn::Assistant { content: String::new(), tool_calls: vec![call] },
            ConversationTurn::ToolResult { call_id: "c1".into(), name: SEARCH_WEB.into(), content: "evidence".into() },
        ];
        let specs = ToolCommand::specs();
        let req = ChatRequest { system: "sys", transcript: &transcript, tools: &specs };
        let msgs = to_messages(&req).unwrap();
        assert_eq!(msgs.len(), 4);
        assert!(matches!(msgs[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(msgs[1], ChatCompletionRequestMessage::User(_)));
        match &msgs[2] {
            ChatCompletionRequestMessage::Assistant(a) => {
                let calls = a.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].function.arguments, r#"{"query":"q"}"#);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &msgs[3] {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, "c1"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(to_tools(&specs).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresponsive_endpoint_hits_the_call_timeout() {
        // Bound but never accepted: the request is sent and no answer comes back.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let llm = LlmClient::openai("m".into(), Some(format!("http://{addr}/v1")), Some("k".into()), 50);
        let transcript = [ConversationTurn::user("claim")];
        let err = llm.chat(ChatRequest { system: "sys", transcript: &transcript, tools: &[] }).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(50)));
        drop(listener);
    }
}
