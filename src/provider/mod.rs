//! Model provider abstractions.
//!
//! Defines the [`Model`] trait every backend implements, the shared
//! request/response types, and model-id capability helpers used to pick a
//! backend for a configured model.

pub mod mock;
pub mod openai;

pub use openai::{ChatModel, CompletionModel, OpenAIClient, OpenAIClientBuilder};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::message::{ChatMessage, ToolCall};
use crate::tool::ToolDefinition;

/// Token usage information from a model response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt.
    pub input_tokens: u32,
    /// Number of tokens in the output/completion.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Create new token usage with specified counts.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Get total token count.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// Response from a model generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated message.
    pub message: ChatMessage,
    /// Token usage information, if the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// Create a new model response.
    #[must_use]
    pub const fn new(message: ChatMessage) -> Self {
        Self {
            message,
            token_usage: None,
        }
    }

    /// Set token usage.
    #[must_use]
    pub const fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    /// Get the text content of the response.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.text_content()
    }

    /// Get tool calls from the response.
    #[must_use]
    pub const fn tool_calls(&self) -> Option<&Vec<ToolCall>> {
        self.message.tool_calls.as_ref()
    }
}

/// Options for model generation requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Available tools for function calling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Temperature for sampling (0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Create new default generate options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set available tools for function calling.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// The core trait for language model implementations.
#[async_trait]
pub trait Model: Send + Sync {
    /// Get the model identifier (e.g., "gpt-4o-mini").
    fn model_id(&self) -> &str;

    /// Generate a response for the given messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response cannot be parsed.
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError>;

    /// Check if the model supports tool/function calling.
    fn supports_tool_calling(&self) -> bool {
        true
    }
}

fn bare_model_name(model_id: &str) -> &str {
    model_id.split('/').next_back().unwrap_or(model_id)
}

/// Check if a model ID belongs to the legacy text-completion family.
///
/// Instruct variants and the pre-chat base models (davinci, babbage, curie,
/// ada, text-*) only speak the `/completions` endpoint.
#[must_use]
pub fn model_is_legacy_completion(model_id: &str) -> bool {
    let name = bare_model_name(model_id);
    name.ends_with("-instruct")
        || name.starts_with("davinci")
        || name.starts_with("babbage")
        || name.starts_with("curie")
        || name.starts_with("ada")
        || name.starts_with("text-")
}

/// Check if a model ID belongs to a chat-completions family.
#[must_use]
pub fn model_supports_chat_api(model_id: &str) -> bool {
    let name = bare_model_name(model_id);
    if model_is_legacy_completion(name) {
        return false;
    }
    name.starts_with("gpt-3.5-turbo")
        || name.starts_with("gpt-4")
        || name.starts_with("gpt-5")
        || name.starts_with("o1")
        || name.starts_with("o3")
        || name.starts_with("o4")
        || name.starts_with("chatgpt")
}

/// Check if a model requires `max_completion_tokens` instead of `max_tokens`.
///
/// The o-series and gpt-5 series deprecate the `max_tokens` parameter.
#[must_use]
pub fn model_requires_max_completion_tokens(model_id: &str) -> bool {
    let name = bare_model_name(model_id);
    name.starts_with("o1")
        || name.starts_with("o3")
        || name.starts_with("o4")
        || name.starts_with("gpt-5")
}
