//! Unified error types for the wizard-agent crate.
//!
//! The taxonomy mirrors the failure surfaces of the system: tool execution
//! (bad expressions, arithmetic faults, lookup failures), LLM provider calls,
//! backend selection, and configuration.

use std::fmt;

/// Result type alias for wizard-agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Tool execution error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// No model backend is compatible with the configured model.
    #[error("Agent unavailable: {0}")]
    AgentUnavailable(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Maximum steps reached during the tool-calling loop.
    #[error("Maximum steps ({max_steps}) reached without final answer")]
    MaxSteps {
        /// The maximum number of steps configured.
        max_steps: usize,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an agent-unavailable error with a message.
    #[must_use]
    pub fn agent_unavailable(msg: impl Into<String>) -> Self {
        Self::AgentUnavailable(msg.into())
    }

    /// Create a max steps error.
    #[must_use]
    pub const fn max_steps(max_steps: usize) -> Self {
        Self::MaxSteps { max_steps }
    }
}

/// Error type for LLM provider operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmError {
    /// The error kind.
    pub kind: LlmErrorKind,
    /// The provider name (e.g., "openai").
    pub provider: Option<String>,
    /// Additional error message.
    pub message: String,
    /// Optional error code from the provider.
    pub code: Option<String>,
}

/// Categories of LLM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LlmErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Network or connection error.
    Network,
    /// HTTP status error.
    HttpStatus,
    /// Response format error.
    ResponseFormat,
    /// Provider-specific error.
    Provider,
}

impl LlmError {
    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Auth,
            provider: Some(provider.into()),
            message: message.into(),
            code: None,
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Network,
            provider: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::HttpStatus,
            provider: None,
            message: format!("HTTP {status}: {}", body.into()),
            code: Some(status.to_string()),
        }
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::ResponseFormat,
            provider: None,
            message: format!("Expected {}, got {}", expected.into(), got.into()),
            code: None,
        }
    }

    /// Create a provider-specific error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Provider,
            provider: Some(provider.into()),
            message: message.into(),
            code: None,
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for tool execution failures.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The arithmetic input is malformed or uses a disallowed construct.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Arithmetic fault during evaluation (e.g., division by zero).
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// The wizard lookup failed (network error or non-2xx response).
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Invalid arguments provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool not found in the toolbox.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Error during tool execution.
    #[error("Execution error: {0}")]
    Execution(String),
}

impl ToolError {
    /// Create an invalid expression error.
    #[must_use]
    pub fn invalid_expression(msg: impl Into<String>) -> Self {
        Self::InvalidExpression(msg.into())
    }

    /// Create an arithmetic error.
    #[must_use]
    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::Arithmetic(msg.into())
    }

    /// Create a lookup error.
    #[must_use]
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod error {
        use super::*;

        #[test]
        fn config_creates_error() {
            let err = Error::config("OPENAI_API_KEY is not set");
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        }

        #[test]
        fn agent_unavailable_creates_error() {
            let err = Error::agent_unavailable("no backend for model 'ada'");
            assert!(matches!(err, Error::AgentUnavailable(_)));
            assert!(err.to_string().contains("ada"));
        }

        #[test]
        fn max_steps_creates_error() {
            let err = Error::max_steps(6);
            assert!(matches!(err, Error::MaxSteps { max_steps: 6 }));
            assert!(err.to_string().contains('6'));
        }

        #[test]
        fn from_tool_error() {
            let tool_err = ToolError::arithmetic("division by zero");
            let err: Error = tool_err.into();
            assert!(matches!(err, Error::Tool(_)));
        }

        #[test]
        fn from_llm_error() {
            let llm_err = LlmError::network("timeout");
            let err: Error = llm_err.into();
            assert!(matches!(err, Error::Llm(_)));
        }

        #[test]
        fn from_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    mod llm_error {
        use super::*;

        #[test]
        fn auth_creates_error() {
            let err = LlmError::auth("openai", "Invalid API key");
            assert_eq!(err.kind, LlmErrorKind::Auth);
            assert_eq!(err.provider.as_deref(), Some("openai"));
        }

        #[test]
        fn http_status_carries_code() {
            let err = LlmError::http_status(429, "Too Many Requests");
            assert_eq!(err.kind, LlmErrorKind::HttpStatus);
            assert_eq!(err.code.as_deref(), Some("429"));
            assert!(err.message.contains("429"));
        }

        #[test]
        fn display_with_provider() {
            let err = LlmError::auth("openai", "Invalid key");
            let s = err.to_string();
            assert!(s.contains("[openai]"));
            assert!(s.contains("Invalid key"));
        }

        #[test]
        fn display_without_provider() {
            let err = LlmError::network("timeout");
            assert!(!err.to_string().contains('['));
        }

        #[test]
        fn response_format_message() {
            let err = LlmError::response_format("text content", "empty message");
            assert_eq!(err.kind, LlmErrorKind::ResponseFormat);
            assert!(err.message.contains("text content"));
        }
    }

    mod tool_error {
        use super::*;

        #[test]
        fn invalid_expression_display() {
            let err = ToolError::invalid_expression("unexpected character '_'");
            assert!(err.to_string().contains("Invalid expression"));
        }

        #[test]
        fn arithmetic_display() {
            let err = ToolError::arithmetic("division by zero");
            assert!(err.to_string().contains("division by zero"));
        }

        #[test]
        fn lookup_display() {
            let err = ToolError::lookup("wizard API returned HTTP 500");
            assert!(err.to_string().contains("Lookup failed"));
        }

        #[test]
        fn not_found_display() {
            let err = ToolError::not_found("my_tool");
            assert!(err.to_string().contains("my_tool"));
        }

        #[test]
        fn from_serde_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: ToolError = json_err.into();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }
    }

    mod integration {
        use super::*;

        #[test]
        fn error_chain_tool_to_error() {
            fn inner() -> std::result::Result<(), ToolError> {
                Err(ToolError::invalid_expression("bad token"))
            }

            fn outer() -> Result<()> {
                inner()?;
                Ok(())
            }

            assert!(matches!(outer().unwrap_err(), Error::Tool(_)));
        }
    }
}
