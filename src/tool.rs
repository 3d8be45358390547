//! Tool trait and utilities for defining agent tools.
//!
//! Tools are the capabilities the agent can invoke. Each tool declares a
//! name, a description, and a JSON schema for its arguments; the definition
//! serializes to the OpenAI function-calling format
//! `{"type": "function", "function": {...}}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::ToolError;

/// A type alias for `Result<T, ToolError>`.
pub type ToolResult<T> = Result<T, ToolError>;

/// Definition of a tool for LLM function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool (snake_case).
    pub name: String,
    /// Description of what the tool does; helps the model decide when to use it.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Returns the tool name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialize to the OpenAI function-calling format.
    #[must_use]
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// The core trait for all tools the agent can use.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static name of the tool.
    const NAME: &'static str;

    /// Arguments type for the tool.
    type Args: for<'de> Deserialize<'de> + Send;

    /// Output type of the tool.
    type Output: Serialize + Send;

    /// Error type for tool execution.
    type Error: Into<ToolError> + Send;

    /// Get the name of the tool.
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Get the description of the tool.
    fn description(&self) -> String;

    /// Get the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Get the tool definition for LLM function calling.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters_schema())
    }

    /// Call the tool with JSON arguments and return JSON output.
    ///
    /// Accepts either an argument object or a JSON-encoded string of one,
    /// since providers deliver tool-call arguments both ways.
    async fn call_json(&self, args: Value) -> Result<Value, ToolError>
    where
        Self::Output: 'static,
    {
        let typed_args: Self::Args = match &args {
            Value::String(s) => {
                serde_json::from_str(s).map_err(|e| ToolError::InvalidArguments(e.to_string()))?
            }
            _ => serde_json::from_value(args)
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?,
        };

        let result = self.call(typed_args).await.map_err(Into::into)?;
        serde_json::to_value(result).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

/// A boxed dynamic tool that can be used in collections.
pub type BoxedTool = Box<dyn DynTool>;

/// Object-safe version of the [`Tool`] trait for dynamic dispatch.
#[async_trait]
pub trait DynTool: Send + Sync {
    /// Get the name of the tool.
    fn name(&self) -> &str;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Call the tool with JSON arguments.
    async fn call_json(&self, args: Value) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: Tool + 'static> DynTool for T
where
    T::Output: 'static,
{
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn call_json(&self, args: Value) -> Result<Value, ToolError> {
        Tool::call_json(self, args).await
    }
}

/// A collection of tools available to the agent, keyed by name.
#[derive(Default)]
pub struct ToolBox {
    tools: HashMap<String, BoxedTool>,
}

impl ToolBox {
    /// Create a new empty toolbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool to the toolbox.
    pub fn add<T: Tool + 'static>(&mut self, tool: T)
    where
        T::Output: 'static,
    {
        self.tools.insert(tool.name().to_owned(), Box::new(tool));
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.tools.get(name)
    }

    /// Get all tool definitions for use in chat requests.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Get the names of all tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Check if the toolbox contains a tool with the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of tools in the toolbox.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the toolbox is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name with JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_owned()))?;
        tool.call_json(args).await
    }
}

impl fmt::Debug for ToolBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBox")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoArgs {
        message: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        const NAME: &'static str = "echo";
        type Args = EchoArgs;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Echoes back the input message.".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"}
                },
                "required": ["message"]
            })
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.message)
        }
    }

    mod tool_definition {
        use super::*;

        #[test]
        fn openai_format() {
            let def = Tool::definition(&EchoTool);
            let json = def.to_openai_format();

            assert_eq!(json["type"], "function");
            assert_eq!(json["function"]["name"], "echo");
            assert!(json["function"]["parameters"].is_object());
            assert!(!json["function"]["description"].as_str().unwrap().is_empty());
        }

        #[test]
        fn name_accessor() {
            let def = ToolDefinition::new("t", "desc", serde_json::json!({}));
            assert_eq!(def.name(), "t");
        }
    }

    mod call_json {
        use super::*;

        #[tokio::test]
        async fn object_arguments() {
            let out = Tool::call_json(&EchoTool, serde_json::json!({"message": "hi"}))
                .await
                .unwrap();
            assert_eq!(out, serde_json::json!("hi"));
        }

        #[tokio::test]
        async fn string_arguments() {
            let args = Value::String(r#"{"message": "hi"}"#.to_owned());
            let out = Tool::call_json(&EchoTool, args).await.unwrap();
            assert_eq!(out, serde_json::json!("hi"));
        }

        #[tokio::test]
        async fn invalid_arguments() {
            let result = Tool::call_json(&EchoTool, serde_json::json!({"wrong": 1})).await;
            assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
        }
    }

    mod tool_box {
        use super::*;

        #[test]
        fn add_and_lookup() {
            let mut toolbox = ToolBox::new();
            assert!(toolbox.is_empty());

            toolbox.add(EchoTool);
            assert_eq!(toolbox.len(), 1);
            assert!(toolbox.contains("echo"));
            assert!(toolbox.get("echo").is_some());
            assert!(toolbox.get("missing").is_none());
        }

        #[test]
        fn definitions_cover_all_tools() {
            let mut toolbox = ToolBox::new();
            toolbox.add(EchoTool);
            let defs = toolbox.definitions();
            assert_eq!(defs.len(), 1);
            assert_eq!(defs[0].name, "echo");
        }

        #[tokio::test]
        async fn call_executes_tool() {
            let mut toolbox = ToolBox::new();
            toolbox.add(EchoTool);

            let out = toolbox
                .call("echo", serde_json::json!({"message": "hello"}))
                .await
                .unwrap();
            assert_eq!(out, serde_json::json!("hello"));
        }

        #[tokio::test]
        async fn call_unknown_tool_is_not_found() {
            let toolbox = ToolBox::new();
            let result = toolbox.call("nope", serde_json::json!({})).await;
            assert!(matches!(result, Err(ToolError::NotFound(_))));
        }

        #[test]
        fn debug_lists_tool_names() {
            let mut toolbox = ToolBox::new();
            toolbox.add(EchoTool);
            assert!(format!("{toolbox:?}").contains("echo"));
        }
    }
}
