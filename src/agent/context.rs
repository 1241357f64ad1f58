//! Transcript assembly for the reasoning loop.

use crate::types::*;

/// Corrective feedback appended after a malformed step.
pub fn malformed_feedback(reason: &str, tool_names: &[&str]) -> String {
    format!(
        "Invalid step: {}. You must either call one of the tools [{}] through a \
         function call with an \"input\" argument, or reply with your final answer \
         as plain text.",
        reason,
        tool_names.join(", ")
    )
}

/// Observation text for a tool name the registry does not know.
pub fn invalid_tool_message(name: &str, tool_names: &[&str]) -> String {
    format!(
        "{} is not a valid tool, try one of [{}].",
        name,
        tool_names.join(", ")
    )
}

/// Answer for tool calls beyond the first in a single response.
pub const SKIPPED_CALL: &str =
    "Skipped: only one tool call is executed per step. Call it again if you still need it.";

/// The first two messages of every query.
pub fn initial_transcript(system_prompt: &str, query: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(system_prompt), ChatMessage::user(query)]
}

/// Record a malformed response and the correction for it.
///
/// Every tool call id the model emitted gets an answer, otherwise the
/// next request would be rejected by the API.
pub fn push_correction(
    transcript: &mut Vec<ChatMessage>,
    response: &InferenceResponse,
    feedback: &str,
) {
    let content = response.content.clone().unwrap_or_default();
    if response.tool_calls.is_empty() {
        if !content.trim().is_empty() {
            transcript.push(ChatMessage::assistant(content, Vec::new()));
        }
        transcript.push(ChatMessage::user(feedback));
    } else {
        transcript.push(ChatMessage::assistant(content, response.tool_calls.clone()));
        for call in &response.tool_calls {
            transcript.push(ChatMessage::tool(call.id.clone(), feedback));
        }
    }
}
