//! A command-line LLM agent with two tools: a safe arithmetic calculator
//! and a Wizard World potion lookup.
//!
//! The agent picks one of two `OpenAI` backends at construction time based
//! on the configured model id (chat completions with tool calling, or the
//! legacy text-completion API) and answers queries either directly, through
//! a local shortcut, or by running the model in a tool-calling loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use wizard_agent::{Agent, AgentConfig};
//!
//! let config = AgentConfig::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let answer = agent.run("What is 2 + 3 * 4?").await?;
//! assert_eq!(answer, "14");
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod repl;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentBackend, DEFAULT_INSTRUCTIONS};
pub use config::AgentConfig;
pub use error::{Error, LlmError, Result, ToolError};
pub use message::{ChatMessage, MessageRole, ToolCall};
pub use provider::{GenerateOptions, Model, ModelResponse, TokenUsage};
pub use tool::{Tool, ToolBox, ToolDefinition};
