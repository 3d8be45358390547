//! Wizard World potion lookup tool.
//!
//! Queries the public Wizard World API for wizards whose name contains the
//! query string (case-insensitive) and flattens their elixirs into one flat
//! potion list. A query that matches nobody is a successful lookup with an
//! empty list; only transport failures and non-2xx responses are errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::Tool;

/// Base URL of the public Wizard World API.
pub const WIZARD_API_BASE_URL: &str = "https://wizard-world-api.herokuapp.com";

/// How many matching wizards a single lookup inspects at most.
const MAX_WIZARDS: usize = 5;

/// Tool that looks up potions brewed by wizards matching a name query.
#[derive(Debug, Clone)]
pub struct WizardLookupTool {
    client: reqwest::Client,
    base_url: String,
}

/// Arguments for the wizard lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardLookupArgs {
    /// Full or partial wizard name to search for.
    pub name: String,
}

/// One potion attributed to a wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionRecord {
    /// Display name of the wizard who brews the potion.
    pub wizard: String,
    /// Name of the potion.
    pub potion_name: String,
    /// What the potion does, if the API knows.
    pub potion_description: String,
}

/// Result of a lookup: the query echoed back plus the flattened potions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    /// The name query that produced this result.
    pub query: String,
    /// Potions brewed by matching wizards, possibly empty.
    pub potions: Vec<PotionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WizardRecord {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    elixirs: Vec<ElixirRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElixirRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    effect: Option<String>,
}

impl WizardRecord {
    fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_owned(),
            (None, Some(last)) => last.to_owned(),
            (None, None) => "Unknown wizard".to_owned(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.full_name().to_lowercase().contains(needle)
    }
}

impl WizardLookupTool {
    /// Create a lookup tool against the public Wizard World API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(WIZARD_API_BASE_URL)
    }

    /// Create a lookup tool against a custom base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Look up potions for wizards matching `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] for a blank query and
    /// [`ToolError::Lookup`] when the API is unreachable or responds with
    /// a non-success status.
    pub async fn lookup(&self, name: &str) -> Result<LookupResponse, ToolError> {
        let query = name.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_args("wizard name must not be blank"));
        }

        tracing::debug!(query, "looking up wizards");

        let response = self
            .client
            .get(format!("{}/wizards", self.base_url))
            .query(&[("name", query)])
            .send()
            .await
            .map_err(|e| ToolError::lookup(format!("wizard API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::lookup(format!(
                "wizard API returned HTTP {}",
                status.as_u16()
            )));
        }

        let wizards: Vec<WizardRecord> = response
            .json()
            .await
            .map_err(|e| ToolError::lookup(format!("malformed wizard API response: {e}")))?;

        let needle = query.to_lowercase();
        let potions: Vec<PotionRecord> = wizards
            .iter()
            .filter(|w| w.matches(&needle))
            .take(MAX_WIZARDS)
            .flat_map(|w| {
                let wizard = w.full_name();
                w.elixirs.iter().map(move |e| PotionRecord {
                    wizard: wizard.clone(),
                    potion_name: e.name.clone().unwrap_or_default(),
                    potion_description: e.effect.clone().unwrap_or_default(),
                })
            })
            .collect();

        tracing::debug!(query, potions = potions.len(), "lookup complete");

        Ok(LookupResponse {
            query: query.to_owned(),
            potions,
        })
    }
}

impl Default for WizardLookupTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WizardLookupTool {
    const NAME: &'static str = "wizard_lookup";
    type Args = WizardLookupArgs;
    type Output = LookupResponse;
    type Error = ToolError;

    fn description(&self) -> String {
        "Looks up potions brewed by wizards from the Wizard World universe. \
         Takes a full or partial wizard name and returns the potions each \
         matching wizard is known for."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Full or partial wizard name, e.g. \"Dumbledore\""
                }
            },
            "required": ["name"]
        })
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.lookup(&args.name).await
    }
}
