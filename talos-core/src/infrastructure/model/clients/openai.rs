//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::AgentConfig;
use crate::domain::{ChatMessage, FinishReason, TokenUsage, ToolCall};
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

/// OpenAI-compatible client (works with OpenAI, Mistral, Groq, local gateways, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base: HttpClientBase::new("openai".to_string(), endpoint.into(), Some(api_key.into())),
            api_path: "/chat/completions".to_string(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);

        let has_tools = !request.tools.is_empty();
        let payload = OpenAIRequest {
            model: request.model,
            messages: request.messages,
            tools: has_tools.then_some(request.tools),
            tool_choice: has_tools.then_some("auto"),
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = payload.model.as_str(),
            messages = payload.messages.len(),
            tools = payload.tools.as_ref().map(Vec::len).unwrap_or(0),
            "Sending chat completion request"
        );

        let response = self.base.post_with_bearer(&url, &payload).await?;
        let status = response.status();
        let body = response.text().await.map_err(ModelError::network)?;

        if !status.is_success() {
            return Err(ModelError::http(status.as_u16(), body));
        }

        let decoded = decode_body(&body)?;
        debug!(
            finish_reason = match &decoded.finish_reason {
                FinishReason::Stop => "stop",
                FinishReason::ToolCalls => "tool_calls",
                FinishReason::Other(other) => other.as_str(),
            },
            tool_calls = decoded.tool_calls.len(),
            "Received chat completion response"
        );

        Ok(decoded)
    }
}

fn decode_body(body: &str) -> Result<ModelResponse, ModelError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|source| ModelError::malformed(format!("invalid JSON body: {source}")))?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown provider error");
        return Err(ModelError::api(message));
    }

    let parsed: OpenAIResponse = serde_json::from_value(value)
        .map_err(|source| ModelError::malformed(format!("unexpected response shape: {source}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::malformed("response contained no choices"))?;
    let finish_reason = FinishReason::from_wire(choice.finish_reason.as_deref());
    let message = choice
        .message
        .ok_or_else(|| ModelError::malformed("choice missing message"))?;

    Ok(ModelResponse {
        content: message.content,
        tool_calls: message.tool_calls,
        finish_reason,
        usage: parsed.usage,
    })
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}
