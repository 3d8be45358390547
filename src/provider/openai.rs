//! `OpenAI` API client and model implementations.
//!
//! One client, two backends: [`ChatModel`] speaks the Chat Completions API
//! with tool calling, [`CompletionModel`] speaks the legacy `/completions`
//! API for instruct-era models that never learned to chat.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    GenerateOptions, Model, ModelResponse, TokenUsage, model_requires_max_completion_tokens,
};
use crate::error::LlmError;
use crate::message::{ChatMessage, MessageRole, ToolCall};
use crate::tool::ToolDefinition;

/// Default `OpenAI` API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

/// `OpenAI` API client for creating models.
///
/// # Example
///
/// ```rust,ignore
/// use wizard_agent::provider::OpenAIClient;
///
/// let client = OpenAIClient::builder()
///     .api_key("sk-...")
///     .base_url("https://my-openai-proxy.com/v1")
///     .build();
/// let model = client.chat_model("gpt-4o-mini");
/// ```
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new `OpenAI` client with the given API key.
    ///
    /// Uses the default `OpenAI` API base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    /// Create a chat-completions model with the specified model ID.
    #[must_use]
    pub fn chat_model(&self, model_id: impl Into<String>) -> ChatModel {
        ChatModel {
            client: self.clone(),
            model_id: model_id.into(),
        }
    }

    /// Create a legacy text-completion model with the specified model ID.
    #[must_use]
    pub fn completion_model(&self, model_id: impl Into<String>) -> CompletionModel {
        CompletionModel {
            client: self.clone(),
            model_id: model_id.into(),
        }
    }

    /// Get the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the authorization headers for API requests.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .expect("Invalid API key format"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, LlmError> {
        let response = self
            .http_client
            .post(format!("{}{path}", self.base_url))
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        Ok(response.json().await?)
    }
}

async fn error_from_response(status: StatusCode, response: reqwest::Response) -> LlmError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map_or(body, |parsed| parsed.error.message);

    if status == StatusCode::UNAUTHORIZED {
        LlmError::auth(PROVIDER, message)
    } else {
        LlmError::http_status(status.as_u16(), message)
    }
}

/// Builder for [`OpenAIClient`].
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAIClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    ///
    /// Useful for Azure `OpenAI`, local models, or proxies.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Panics
    ///
    /// Panics if the API key is not set.
    #[must_use]
    pub fn build(self) -> OpenAIClient {
        let api_key = self.api_key.expect("API key is required");
        let base_url = self
            .base_url
            .unwrap_or_else(|| OPENAI_API_BASE_URL.to_string());

        let mut client_builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }
        let http_client = client_builder.build().expect("Failed to build HTTP client");

        OpenAIClient {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// `OpenAI` Chat Completions model with tool calling.
#[derive(Clone)]
pub struct ChatModel {
    client: OpenAIClient,
    model_id: String,
}

impl std::fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl ChatModel {
    fn build_request_body(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Value {
        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": convert_messages(messages),
        });

        if let Some(temp) = options.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max) = options.max_tokens {
            if model_requires_max_completion_tokens(&self.model_id) {
                body["max_completion_tokens"] = serde_json::json!(max);
            } else {
                body["max_tokens"] = serde_json::json!(max);
            }
        }

        if let Some(tools) = &options.tools
            && !tools.is_empty()
        {
            let tool_defs: Vec<Value> =
                tools.iter().map(ToolDefinition::to_openai_format).collect();
            body["tools"] = serde_json::json!(tool_defs);
        }

        body
    }

    fn parse_response(&self, json: &Value) -> Result<ModelResponse, LlmError> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| LlmError::response_format("choices array", "no choices in response"))?;

        let message_json = &choice["message"];
        let content = message_json["content"].as_str().map(String::from);

        let tool_calls = message_json["tool_calls"].as_array().map(|tc_array| {
            tc_array
                .iter()
                .map(|tc| {
                    let id = tc["id"].as_str().unwrap_or_default().to_owned();
                    let name = tc["function"]["name"].as_str().unwrap_or_default().to_owned();
                    let arguments = match tc["function"]["arguments"].as_str() {
                        Some(args_str) => serde_json::from_str(args_str)
                            .unwrap_or_else(|_| Value::Object(serde_json::Map::new())),
                        None => tc["function"]["arguments"].clone(),
                    };
                    ToolCall::new(id, name, arguments)
                })
                .collect::<Vec<_>>()
        });

        let message = ChatMessage {
            role: MessageRole::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        };

        Ok(ModelResponse {
            message,
            token_usage: parse_token_usage(json),
        })
    }
}

#[async_trait]
impl Model for ChatModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn supports_tool_calling(&self) -> bool {
        true
    }

    #[instrument(skip(self, messages, options), fields(model = %self.model_id))]
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let body = self.build_request_body(&messages, &options);

        debug!("sending chat completion request");

        let json = self.client.post_json("/chat/completions", &body).await?;
        self.parse_response(&json)
    }
}

/// `OpenAI` legacy text-completion model.
///
/// Messages are flattened into a single transcript-style prompt since the
/// `/completions` endpoint has no concept of roles or tools.
#[derive(Clone)]
pub struct CompletionModel {
    client: OpenAIClient,
    model_id: String,
}

impl std::fmt::Debug for CompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionModel")
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl CompletionModel {
    fn render_prompt(messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        for msg in messages {
            if let Some(text) = msg.text_content() {
                let label = match msg.role {
                    MessageRole::System => "System",
                    MessageRole::User => "User",
                    MessageRole::Assistant => "Assistant",
                    MessageRole::Tool => "Tool",
                };
                prompt.push_str(label);
                prompt.push_str(": ");
                prompt.push_str(text);
                prompt.push_str("\n\n");
            }
        }
        prompt.push_str("Assistant:");
        prompt
    }

    fn parse_response(&self, json: &Value) -> Result<ModelResponse, LlmError> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| LlmError::response_format("choices array", "no choices in response"))?;

        let text = choice["text"]
            .as_str()
            .ok_or_else(|| LlmError::response_format("text completion", "missing text field"))?;

        let message = ChatMessage::assistant(text.trim());

        Ok(ModelResponse {
            message,
            token_usage: parse_token_usage(json),
        })
    }
}

#[async_trait]
impl Model for CompletionModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn supports_tool_calling(&self) -> bool {
        false
    }

    #[instrument(skip(self, messages, options), fields(model = %self.model_id))]
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let mut body = serde_json::json!({
            "model": self.model_id,
            "prompt": Self::render_prompt(&messages),
        });

        if let Some(temp) = options.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }

        debug!("sending legacy completion request");

        let json = self.client.post_json("/completions", &body).await?;
        self.parse_response(&json)
    }
}

fn convert_messages(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            let mut obj = serde_json::json!({ "role": msg.role.as_str() });

            if let Some(text) = msg.text_content() {
                obj["content"] = serde_json::json!(text);
            }

            if let Some(tool_calls) = &msg.tool_calls {
                let tc_json: Vec<Value> = tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": tc.arguments_string()
                            }
                        })
                    })
                    .collect();
                obj["tool_calls"] = serde_json::json!(tc_json);
            }

            if let Some(tool_call_id) = &msg.tool_call_id {
                obj["tool_call_id"] = serde_json::json!(tool_call_id);
            }

            obj
        })
        .collect()
}

fn parse_token_usage(json: &Value) -> Option<TokenUsage> {
    json.get("usage").map(|usage| TokenUsage {
        input_tokens: saturating_u32(usage["prompt_tokens"].as_u64().unwrap_or(0)),
        output_tokens: saturating_u32(usage["completion_tokens"].as_u64().unwrap_or(0)),
    })
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// `OpenAI` API error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// `OpenAI` API error details.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
