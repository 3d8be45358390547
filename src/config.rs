//! Agent configuration.
//!
//! Configuration is sourced from environment variables once at startup. A
//! missing API key is a hard error before any agent is constructed.

use crate::error::{Error, Result};
use crate::tools::wizard::WIZARD_API_BASE_URL;

/// Default model when `WIZARD_AGENT_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default cap on tool-loop iterations per query.
pub const DEFAULT_MAX_STEPS: usize = 6;

/// Runtime configuration for the agent.
#[derive(Clone)]
pub struct AgentConfig {
    /// `OpenAI` API key.
    pub api_key: String,
    /// Custom `OpenAI`-compatible base URL, if any.
    pub openai_base_url: Option<String>,
    /// Model identifier to run.
    pub model: String,
    /// Base URL of the Wizard World API.
    pub wizard_base_url: String,
    /// Maximum tool-loop iterations per query.
    pub max_steps: usize,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("wizard_base_url", &self.wizard_base_url)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl AgentConfig {
    /// Create a configuration with the given API key and defaults elsewhere.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            openai_base_url: None,
            model: DEFAULT_MODEL.to_owned(),
            wizard_base_url: WIZARD_API_BASE_URL.to_owned(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`,
    /// `WIZARD_AGENT_MODEL`, and `WIZARD_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `OPENAI_API_KEY` is unset or blank.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("OPENAI_API_KEY environment variable is not set"))?;

        let mut config = Self::new(api_key);

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.openai_base_url = Some(base_url);
        }
        if let Ok(model) = std::env::var("WIZARD_AGENT_MODEL") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("WIZARD_API_BASE_URL") {
            config.wizard_base_url = url;
        }

        Ok(config)
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom `OpenAI`-compatible base URL.
    #[must_use]
    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }

    /// Set the Wizard World API base URL.
    #[must_use]
    pub fn with_wizard_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.wizard_base_url = base_url.into();
        self
    }

    /// Set the maximum tool-loop iterations per query.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AgentConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.wizard_base_url, WIZARD_API_BASE_URL);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert!(config.openai_base_url.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = AgentConfig::new("sk-test")
            .with_model("gpt-4o")
            .with_openai_base_url("http://localhost:8080/v1")
            .with_wizard_base_url("http://localhost:9090")
            .with_max_steps(3);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(
            config.openai_base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.wizard_base_url, "http://localhost:9090");
        assert_eq!(config.max_steps, 3);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AgentConfig::new("sk-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    // Environment mutation is process-global, so all from_env cases run in
    // one test to avoid racing parallel tests.
    #[test]
    fn from_env_cases() {
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_BASE_URL");
            std::env::remove_var("WIZARD_AGENT_MODEL");
            std::env::remove_var("WIZARD_API_BASE_URL");
        }

        let err = AgentConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        unsafe {
            std::env::set_var("OPENAI_API_KEY", "   ");
        }
        assert!(matches!(
            AgentConfig::from_env().unwrap_err(),
            Error::Config(_)
        ));

        unsafe {
            std::env::set_var("OPENAI_API_KEY", "sk-test");
            std::env::set_var("WIZARD_AGENT_MODEL", "gpt-3.5-turbo-instruct");
        }
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-3.5-turbo-instruct");

        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("WIZARD_AGENT_MODEL");
        }
    }
}
