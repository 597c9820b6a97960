use crate::config::LlmSettings;
use crate::error::{Result, RnaseqlError};
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One tool invocation requested by the model. `arguments` is the raw JSON
/// object text, decoded by the tool layer.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn to_json(&self) -> Json {
        let mut message = json!({
            "role": self.role.as_str(),
            "content": self.content,
        });
        if !self.tool_calls.is_empty() {
            message["tool_calls"] = Json::Array(
                self.tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments,
                            },
                        })
                    })
                    .collect(),
            );
        }
        if let Some(id) = &self.tool_call_id {
            message["tool_call_id"] = json!(id);
        }
        message
    }
}

/// Function-calling schema advertised to the model for one tool.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Json,
}

impl ToolDefinition {
    fn to_json(&self) -> Json {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            },
        })
    }
}

/// The decision-maker behind the agent loop. Opaque by design: the core
/// only sees the messages going in and the (text or tool-call) message
/// coming out, so tests can script one without any network.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ChatMessage>;
}

/// Mistral chat-completions client (OpenAI-compatible wire shape) with
/// bounded exponential backoff on rate limits and transient server errors.
pub struct MistralClient {
    client: reqwest::Client,
    settings: LlmSettings,
    api_key: String,
}

impl MistralClient {
    pub fn new(settings: LlmSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RnaseqlError::LlmApi(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            settings,
            api_key: api_key.into(),
        })
    }
}

pub(crate) fn build_request_body(
    model: &str,
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
) -> Json {
    let mut body = json!({
        "model": model,
        "temperature": 0.0,
        "messages": messages.iter().map(ChatMessage::to_json).collect::<Vec<_>>(),
    });
    if !tools.is_empty() {
        body["tools"] = Json::Array(tools.iter().map(ToolDefinition::to_json).collect());
        body["tool_choice"] = json!("auto");
    }
    body
}

pub(crate) fn parse_chat_message(data: &Json) -> Result<ChatMessage> {
    let message = &data["choices"][0]["message"];
    if message.is_null() {
        return Err(RnaseqlError::LlmApi(format!(
            "response has no choices: {data}"
        )));
    }

    let content = message["content"].as_str().unwrap_or("").to_string();
    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|call| ToolCall {
                    id: call["id"].as_str().unwrap_or("").to_string(),
                    name: call["function"]["name"].as_str().unwrap_or("").to_string(),
                    arguments: call["function"]["arguments"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| call["function"]["arguments"].to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ChatMessage {
        role: Role::Assistant,
        content,
        tool_calls,
        tool_call_id: None,
    })
}

#[async_trait]
impl ChatModel for MistralClient {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.settings.base_url);
        let body = build_request_body(&self.settings.model, messages, tools);

        let mut attempt = 0u32;
        loop {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let retryable = match &response {
                Ok(r) => r.status().as_u16() == 429 || r.status().is_server_error(),
                Err(e) => e.is_timeout() || e.is_connect(),
            };

            if retryable && attempt < self.settings.max_retries {
                let wait = Duration::from_secs(1 << attempt);
                warn!(attempt, wait_secs = wait.as_secs(), "LLM call failed, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            let response = response.map_err(|e| RnaseqlError::LlmApi(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(RnaseqlError::LlmApi(format!("{status}: {text}")));
            }

            let data: Json = response
                .json()
                .await
                .map_err(|e| RnaseqlError::LlmApi(format!("invalid response body: {e}")))?;
            return parse_chat_message(&data);
        }
    }
}
