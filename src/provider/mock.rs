//! Scripted mock model for exercising agent behavior without a network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{GenerateOptions, Model, ModelResponse};
use crate::error::LlmError;
use crate::message::{ChatMessage, ToolCall};

/// A [`Model`] that replays scripted responses in order.
///
/// Each call to [`Model::generate`] pops the next scripted response and
/// records the request messages for later inspection. Running out of
/// scripted responses is a provider error, which keeps broken test scripts
/// from looping forever.
#[derive(Debug, Default)]
pub struct MockModel {
    model_id: String,
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockModel {
    /// Create a new mock model with the given model id.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script a plain text response.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse::new(ChatMessage::assistant(text)))
    }

    /// Script a response that requests a single tool call.
    #[must_use]
    pub fn with_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        let call = ToolCall::new(id, name, arguments);
        self.with_response(ModelResponse::new(ChatMessage::assistant_tool_calls(vec![
            call,
        ])))
    }

    /// Script an arbitrary response.
    #[must_use]
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(response);
        self
    }

    /// Number of generate calls made so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("mock lock poisoned").len()
    }

    /// The message lists passed to each generate call, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Model for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        _options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        self.requests
            .lock()
            .expect("mock lock poisoned")
            .push(messages);

        self.responses
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .ok_or_else(|| LlmError::provider("mock", "no scripted response left"))
    }
}
