//! Decode one model response into exactly one `ReasoningStep`.

use crate::types::{InferenceResponse, ReasoningStep, ToolCall};
use serde_json::Value;

/// Marker of a final answer in ReAct-style plain text output.
const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Classify a model response.
///
/// Only the first tool call is considered; the loop answers any others.
pub fn decode(response: &InferenceResponse) -> ReasoningStep {
    if let Some(call) = response.tool_calls.first() {
        return decode_tool_call(call);
    }

    let content = response.content.as_deref().unwrap_or("").trim();
    if content.is_empty() {
        return ReasoningStep::Malformed("the response was empty".into());
    }

    if let Some(idx) = content.rfind(FINAL_ANSWER_MARKER) {
        let answer = content[idx + FINAL_ANSWER_MARKER.len()..].trim();
        if answer.is_empty() {
            return ReasoningStep::Malformed("the final answer was empty".into());
        }
        return ReasoningStep::FinalAnswer(answer.to_string());
    }

    if looks_like_text_action(content) {
        return ReasoningStep::Malformed(
            "a tool was requested in plain text instead of through a function call".into(),
        );
    }

    ReasoningStep::FinalAnswer(content.to_string())
}

fn decode_tool_call(call: &ToolCall) -> ReasoningStep {
    let tool_name = call.name.trim();
    if tool_name.is_empty() {
        return ReasoningStep::Malformed("a tool call had no tool name".into());
    }

    match extract_argument(&call.arguments) {
        Some(argument) => ReasoningStep::ToolInvocation {
            call_id: call.id.clone(),
            tool_name: tool_name.to_string(),
            argument,
        },
        None => ReasoningStep::Malformed(format!(
            "the arguments for '{}' were not a JSON object with a string \"input\" field",
            tool_name
        )),
    }
}

/// Pull the single string argument out of the function-call arguments.
///
/// Accepts `{"input": ".."}`, a JSON string, or an object whose only
/// field is a string (models sometimes rename the parameter).
fn extract_argument(raw: &str) -> Option<String> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::String(s) => Some(s),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("input") {
                return Some(s.clone());
            }
            let mut strings = map.values().filter_map(Value::as_str);
            match (strings.next(), strings.next(), map.len()) {
                (Some(only), None, 1) => Some(only.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn looks_like_text_action(content: &str) -> bool {
    content
        .lines()
        .any(|l| l.trim_start().starts_with("Action:"))
        && content
            .lines()
            .any(|l| l.trim_start().starts_with("Action Input:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> InferenceResponse {
        InferenceResponse {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn call(name: &str, arguments: &str) -> InferenceResponse {
        InferenceResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: name.into(),
                arguments: arguments.into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn plain_content_is_final_answer() {
        assert_eq!(
            decode(&text("  Paris is the capital of France.\n")),
            ReasoningStep::FinalAnswer("Paris is the capital of France.".into())
        );
    }

    #[test]
    fn react_final_answer_marker_is_stripped() {
        let step = decode(&text(
            "Thought: I now know the final answer\nFinal Answer: 42",
        ));
        assert_eq!(step, ReasoningStep::FinalAnswer("42".into()));
    }

    #[test]
    fn empty_or_missing_content_is_malformed() {
        assert!(matches!(decode(&text("   ")), ReasoningStep::Malformed(_)));
        assert!(matches!(
            decode(&InferenceResponse::default()),
            ReasoningStep::Malformed(_)
        ));
        assert!(matches!(decode(&text("Final Answer:  ")), ReasoningStep::Malformed(_)));
    }

    #[test]
    fn text_action_is_malformed() {
        let step = decode(&text(
            "Thought: look it up\nAction: Wikipedia\nAction Input: Alan Turing",
        ));
        assert!(matches!(step, ReasoningStep::Malformed(_)));
    }

    #[test]
    fn function_call_becomes_invocation() {
        assert_eq!(
            decode(&call("Wikipedia", r#"{"input":"Alan Turing"}"#)),
            ReasoningStep::ToolInvocation {
                call_id: "call_1".into(),
                tool_name: "Wikipedia".into(),
                argument: "Alan Turing".into(),
            }
        );
    }

    #[test]
    fn lenient_argument_shapes() {
        assert_eq!(extract_argument(r#"{"query":"rust"}"#), Some("rust".into()));
        assert_eq!(extract_argument(r#""rust""#), Some("rust".into()));
        assert_eq!(extract_argument(r#"{"a":"x","b":"y"}"#), None);
        assert_eq!(extract_argument(r#"{"input":3}"#), None);
        assert_eq!(extract_argument("not json"), None);
        assert_eq!(extract_argument(""), None);
    }

    #[test]
    fn unreadable_arguments_are_malformed() {
        assert!(matches!(
            decode(&call("Wikipedia", "{oops")),
            ReasoningStep::Malformed(_)
        ));
        assert!(matches!(decode(&call("  ", "{}")), ReasoningStep::Malformed(_)));
    }

    #[test]
    fn unknown_tool_name_still_decodes() {
        // Resolution against the registry happens in the loop.
        assert!(matches!(
            decode(&call("Calculator", r#"{"input":"2+2"}"#)),
            ReasoningStep::ToolInvocation { ref tool_name, .. } if tool_name == "Calculator"
        ));
    }
}
