use crate::traits::{
    ChatMessage, ChatRequest, ChatResponse, Provider, Role, ToolCall, ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: OpenAIFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionRequest<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    r#type: String,
    function: OpenAIToolFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

/// Any backend speaking the OpenAI `/chat/completions` dialect (OpenAI, Groq,
/// OpenRouter, Ollama's compatibility endpoint).
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn convert_messages<'a>(&self, messages: &'a [ChatMessage]) -> Vec<OpenAIMessage<'a>> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = m.tool_calls.as_ref().map(|tool_calls| {
                    tool_calls
                        .iter()
                        .map(|tc| OpenAIToolCallRequest {
                            id: &tc.id,
                            r#type: "function",
                            function: OpenAIFunctionRequest {
                                name: &tc.name,
                                arguments: &tc.arguments,
                            },
                        })
                        .collect()
                });

                // An assistant turn that only calls tools carries null content.
                let content = if m.content.is_empty() && m.role == Role::Assistant {
                    None
                } else {
                    Some(m.content.as_str())
                };

                OpenAIMessage {
                    role: m.role.as_str(),
                    content,
                    tool_calls,
                    tool_call_id: m.tool_call_id.as_deref(),
                }
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[ToolSpec]) -> Vec<OpenAITool> {
        tools
            .iter()
            .map(|t| OpenAITool {
                r#type: "function".to_string(),
                function: OpenAIToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters_schema.clone(),
                },
            })
            .collect()
    }
}

/// Reasoning models (qwen3, deepseek-r1) prefix answers with `<think>` blocks
/// that are not part of the reply.
fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let openai_request = OpenAIRequest {
            model: &self.model,
            messages: self.convert_messages(request.messages),
            tools: request
                .tools
                .filter(|t| !t.is_empty())
                .map(|t| self.convert_tools(t)),
            temperature: self.temperature,
        };

        let mut http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&openai_request);
        if !self.api_key.is_empty() {
            http_request = http_request.bearer_auth(&self.api_key);
        }

        let response = http_request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Chat completion API error {}: {}",
                status,
                error_text
            ));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        into_chat_response(openai_response)
    }
}

/// A reply with neither text nor tool calls (for example only a `<think>`
/// block) is still a valid final turn; the agent decides what to do with it.
fn into_chat_response(response: OpenAIResponse) -> anyhow::Result<ChatResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| ToolCall {
            id: c.id,
            name: c.function.name,
            arguments: c.function.arguments,
        })
        .collect();

    let text = choice
        .message
        .content
        .map(|c| strip_reasoning(&c))
        .filter(|c| !c.is_empty());

    Ok(ChatResponse { text, tool_calls })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_reasoning_removes_think_blocks() {
        assert_eq!(
            strip_reasoning("<think>plan the trip</think>\n\n# Venice"),
            "# Venice"
        );
        assert_eq!(strip_reasoning("no reasoning"), "no reasoning");
        assert_eq!(strip_reasoning("answer <think>unterminated"), "answer");
    }

    #[test]
    fn tool_only_assistant_turn_has_null_content() {
        let provider = OpenAIProvider::new("key");
        let messages = vec![
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall {
                    id: "call_1".into(),
                    name: "multiply".into(),
                    arguments: "{\"a\":4,\"b\":25}".into(),
                }],
            ),
            ChatMessage::tool_result("call_1", "100"),
        ];

        let converted = provider.convert_messages(&messages);
        let json = serde_json::to_value(&converted).unwrap();
        assert!(json[0].get("content").is_none());
        assert_eq!(json[0]["tool_calls"][0]["function"]["name"], "multiply");
        assert_eq!(json[1]["role"], "tool");
        assert_eq!(json[1]["tool_call_id"], "call_1");
        assert_eq!(json[1]["content"], "100");
    }

    #[test]
    fn reasoning_only_reply_is_an_empty_final_turn() {
        let response: OpenAIResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"<think>I have what I need.</think>"}}]}"#,
        )
        .unwrap();

        let parsed = into_chat_response(response).unwrap();
        assert!(parsed.text.is_none());
        assert!(!parsed.has_tool_calls());
    }

    #[test]
    fn missing_choices_is_an_error() {
        let response: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(into_chat_response(response).is_err());
    }
}
