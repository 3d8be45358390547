//! The tool-calling conversation loop.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::ChatMessage;
use crate::provider::{GenerateOptions, Model};
use crate::tool::ToolBox;

/// Run a model in a tool-calling loop until it produces a final answer.
///
/// Each iteration sends the conversation so far. When the model requests
/// tool calls, every call is executed and its output (or error text) is
/// appended as a tool message; the loop then continues. A plain text reply
/// ends the loop. Tool failures are reported back to the model rather than
/// aborting, so it can recover or rephrase.
///
/// # Errors
///
/// Returns [`Error::MaxSteps`] if no final answer arrives within
/// `max_steps` iterations, or the underlying provider error if a
/// generation call fails.
pub async fn run_tool_loop(
    model: &dyn Model,
    tools: &ToolBox,
    instructions: &str,
    query: &str,
    max_steps: usize,
) -> Result<String> {
    let mut messages = vec![ChatMessage::system(instructions), ChatMessage::user(query)];

    let definitions = tools.definitions();

    for step in 0..max_steps {
        let mut options = GenerateOptions::new();
        if model.supports_tool_calling() && !definitions.is_empty() {
            options = options.with_tools(definitions.clone());
        }

        let response = model
            .generate(messages.clone(), options)
            .await
            .map_err(Error::Llm)?;

        if let Some(tool_calls) = response.tool_calls().filter(|calls| !calls.is_empty()) {
            debug!(step, calls = tool_calls.len(), "model requested tool calls");

            let calls = tool_calls.clone();
            messages.push(response.message.clone());

            for call in calls {
                let content = match tools.call(&call.name, call.arguments.clone()).await {
                    Ok(output) => tool_output_text(output),
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool call failed");
                        format!("Error: {e}")
                    }
                };
                messages.push(ChatMessage::tool_response(call.id, content));
            }
            continue;
        }

        if let Some(text) = response.text() {
            debug!(step, "model produced final answer");
            return Ok(text.to_owned());
        }

        // Neither text nor tool calls; retrying would just replay the
        // same conversation.
        return Err(Error::Llm(crate::error::LlmError::response_format(
            "text or tool calls",
            "empty assistant message",
        )));
    }

    Err(Error::max_steps(max_steps))
}

/// Render a tool's JSON output as message text. String outputs are passed
/// through bare so the model does not see extra quotes.
fn tool_output_text(output: Value) -> String {
    match output {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::mock::MockModel;
    use crate::tools::CalculatorTool;
    use serde_json::json;

    fn calculator_toolbox() -> ToolBox {
        let mut tools = ToolBox::new();
        tools.add(CalculatorTool);
        tools
    }

    #[tokio::test]
    async fn direct_answer_ends_loop() {
        let model = MockModel::new("mock").with_text("Paris");
        let tools = calculator_toolbox();

        let answer = run_tool_loop(&model, &tools, "Be helpful.", "Capital of France?", 6)
            .await
            .unwrap();

        assert_eq!(answer, "Paris");
        assert_eq!(model.request_count(), 1);
    }

    #[tokio::test]
    async fn tool_call_output_reaches_model() {
        let model = MockModel::new("mock")
            .with_tool_call("call_1", "calculator", json!({"expression": "6 * 7"}))
            .with_text("The answer is 42");
        let tools = calculator_toolbox();

        let answer = run_tool_loop(&model, &tools, "Be helpful.", "What is 6*7?", 6)
            .await
            .unwrap();

        assert_eq!(answer, "The answer is 42");

        // Second request must carry the assistant tool call and its result.
        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert!(second.iter().any(ChatMessage::has_tool_calls));
        assert!(
            second
                .iter()
                .any(|m| m.tool_call_id.as_deref() == Some("call_1")
                    && m.text_content() == Some("42.0"))
        );
    }

    #[tokio::test]
    async fn tool_error_is_fed_back_not_fatal() {
        let model = MockModel::new("mock")
            .with_tool_call("call_1", "calculator", json!({"expression": "1/0"}))
            .with_text("That division is undefined.");
        let tools = calculator_toolbox();

        let answer = run_tool_loop(&model, &tools, "Be helpful.", "1/0?", 6)
            .await
            .unwrap();

        assert_eq!(answer, "That division is undefined.");

        let second = &model.requests()[1];
        let tool_msg = second
            .iter()
            .find(|m| m.tool_call_id.is_some())
            .unwrap();
        assert!(tool_msg.text_content().unwrap().starts_with("Error:"));
    }

    #[tokio::test]
    async fn unknown_tool_is_fed_back() {
        let model = MockModel::new("mock")
            .with_tool_call("call_1", "crystal_ball", json!({}))
            .with_text("Never mind.");
        let tools = calculator_toolbox();

        let answer = run_tool_loop(&model, &tools, "Be helpful.", "q", 6)
            .await
            .unwrap();
        assert_eq!(answer, "Never mind.");
    }

    #[tokio::test]
    async fn max_steps_is_enforced() {
        let model = MockModel::new("mock")
            .with_tool_call("c1", "calculator", json!({"expression": "1+1"}))
            .with_tool_call("c2", "calculator", json!({"expression": "2+2"}))
            .with_tool_call("c3", "calculator", json!({"expression": "3+3"}));
        let tools = calculator_toolbox();

        let err = run_tool_loop(&model, &tools, "Be helpful.", "loop forever", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MaxSteps { max_steps: 3 }));
    }

    #[tokio::test]
    async fn empty_response_is_format_error() {
        let model = MockModel::new("mock").with_response(crate::provider::ModelResponse::new(
            ChatMessage {
                role: crate::message::MessageRole::Assistant,
                content: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ));
        let tools = calculator_toolbox();

        let err = run_tool_loop(&model, &tools, "Be helpful.", "q", 6)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }

    #[test]
    fn string_output_is_unquoted() {
        assert_eq!(tool_output_text(json!("plain")), "plain");
        assert_eq!(tool_output_text(json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(tool_output_text(json!(14.0)), "14.0");
    }
}
