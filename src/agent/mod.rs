//! The wizard agent: backend selection, direct shortcuts, and the run loop.

mod runner;

pub use runner::run_tool_loop;

use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::error::{Error, Result, ToolError};
use crate::provider::{
    ChatModel, CompletionModel, GenerateOptions, Model, OpenAIClient, model_is_legacy_completion,
    model_supports_chat_api,
};
use crate::tool::ToolBox;
use crate::tools::calculator::{self, CalculatorTool};
use crate::tools::wizard::WizardLookupTool;

/// System instructions handed to the model.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant. You can evaluate arithmetic \
    expressions with the calculator tool and look up potions brewed by wizards with the \
    wizard_lookup tool. Answer concisely.";

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Which API family serves the configured model.
///
/// Picked once when the agent is built; queries never re-probe.
#[derive(Debug, Clone)]
pub enum AgentBackend {
    /// Chat Completions with native tool calling.
    ToolCalling(ChatModel),
    /// Legacy text completion, no tools.
    Completion(CompletionModel),
}

impl AgentBackend {
    /// Select a backend for the given model id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AgentUnavailable`] when the model id fits neither
    /// the chat nor the legacy completion family.
    pub fn select(client: &OpenAIClient, model_id: &str) -> Result<Self> {
        if model_supports_chat_api(model_id) {
            debug!(model = model_id, "selected tool-calling backend");
            Ok(Self::ToolCalling(client.chat_model(model_id)))
        } else if model_is_legacy_completion(model_id) {
            debug!(model = model_id, "selected legacy completion backend");
            Ok(Self::Completion(client.completion_model(model_id)))
        } else {
            Err(Error::agent_unavailable(format!(
                "no backend supports model {model_id:?}"
            )))
        }
    }

    fn model(&self) -> &dyn Model {
        match self {
            Self::ToolCalling(model) => model,
            Self::Completion(model) => model,
        }
    }
}

/// An agent wiring an LLM backend to the calculator and wizard lookup tools.
pub struct Agent {
    backend: AgentBackend,
    tools: ToolBox,
    wizard: WizardLookupTool,
    instructions: String,
    max_steps: usize,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.backend.model().model_id())
            .field("tools", &self.tools.names())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl Agent {
    /// Build an agent from configuration.
    ///
    /// The backend is chosen here, once. An unsupported model id fails
    /// construction rather than the first query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AgentUnavailable`] for an unsupported model id.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let mut builder = OpenAIClient::builder()
            .api_key(config.api_key.clone())
            .timeout_secs(REQUEST_TIMEOUT_SECS);
        if let Some(base_url) = &config.openai_base_url {
            builder = builder.base_url(base_url.clone());
        }
        let client = builder.build();

        let backend = AgentBackend::select(&client, &config.model)?;

        let wizard = WizardLookupTool::with_base_url(config.wizard_base_url.clone());
        let mut tools = ToolBox::new();
        tools.add(CalculatorTool);
        tools.add(wizard.clone());

        info!(model = %config.model, "agent ready");

        Ok(Self {
            backend,
            tools,
            wizard,
            instructions: DEFAULT_INSTRUCTIONS.to_owned(),
            max_steps: config.max_steps,
        })
    }

    /// The model id this agent runs on.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.backend.model().model_id()
    }

    /// Answer a single query.
    ///
    /// Two direct shortcuts run before any model call: a query that parses
    /// as arithmetic is evaluated locally, and a query that matches wizards
    /// with potions returns the lookup result as JSON. Everything else goes
    /// to the LLM backend.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] for blank queries and arithmetic faults, or
    /// the backend's error when the model call fails.
    pub async fn run(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_args("query must not be blank").into());
        }

        match calculator::evaluate(query) {
            Ok(value) => {
                debug!(query, "answered arithmetic locally");
                return Ok(calculator::format_number(value));
            }
            // The query is arithmetic but faulty; the model cannot fix
            // division by zero.
            Err(e @ ToolError::Arithmetic(_)) => return Err(e.into()),
            Err(_) => {}
        }

        match self.wizard.lookup(query).await {
            Ok(lookup) if !lookup.potions.is_empty() => {
                debug!(query, "answered via direct wizard lookup");
                return Ok(serde_json::to_string_pretty(&lookup)?);
            }
            Ok(_) => {}
            Err(e) => debug!(query, error = %e, "direct wizard lookup skipped"),
        }

        match &self.backend {
            AgentBackend::ToolCalling(model) => {
                run_tool_loop(model, &self.tools, &self.instructions, query, self.max_steps).await
            }
            AgentBackend::Completion(model) => {
                let messages = vec![
                    crate::message::ChatMessage::system(&self.instructions),
                    crate::message::ChatMessage::user(query),
                ];
                let response = model
                    .generate(messages, GenerateOptions::new())
                    .await
                    .map_err(Error::Llm)?;
                response
                    .text()
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        Error::Llm(crate::error::LlmError::response_format(
                            "text completion",
                            "empty completion",
                        ))
                    })
            }
        }
    }
}
