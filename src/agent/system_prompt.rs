//! System prompt builder.
//!
//! Layers (in order):
//! 1. Role (research assistant)
//! 2. Tool catalogue, generated from the registry
//! 3. Rules for choosing tools and answering
//! 4. Dynamic status (date, model)

use crate::tools::{web_search, ToolRegistry};
use chrono::Local;
use tracing::debug;

const ROLE: &str = r#"
# Role

You are a smart research assistant. You answer questions by looking facts up
with the tools below, then reply with a concise, well-sourced answer.
"#;

const RULES: &str = r#"
# Rules

- Call tools through function calls only, one tool per step, with a single
  "input" string argument.
- Never invent a tool. Only the tools listed above exist.
- Save something to a file only when the user asks you to save or record it.
- When you have enough information, reply with the final answer as plain
  text and no function call.
"#;

/// Build the complete system prompt for a query.
pub fn build_system_prompt(registry: &ToolRegistry, model: &str) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(ROLE);

    prompt.push_str("\n# Tools\n\n");
    for (i, tool) in registry.list().iter().enumerate() {
        prompt.push_str(&format!("{}. {} - {}\n", i + 1, tool.name(), tool.description()));
    }

    prompt.push_str(RULES);
    if registry.find(web_search::NAME).is_some() {
        prompt.push_str(&format!(
            "- If you are unsure which tool fits, use {}.\n",
            web_search::NAME
        ));
    }

    prompt.push_str("\n# Current Status\n\n");
    prompt.push_str(&format!("- **Date**: {}\n", Local::now().format("%Y-%m-%d")));
    prompt.push_str(&format!("- **Model**: {}\n", model));

    debug!("System prompt: {} chars", prompt.len());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use crate::persistence::PersistenceSink;
    use crate::tools::build_registry;

    #[test]
    fn lists_every_tool_with_description() {
        let registry = build_registry(
            &ResearchConfig::default(),
            PersistenceSink::new(std::env::temp_dir().join("prompt-test.txt")),
        )
        .unwrap();
        let prompt = build_system_prompt(&registry, "llama-3.3-70b-versatile");

        for tool in registry.list() {
            assert!(prompt.contains(tool.name()));
            assert!(prompt.contains(tool.description()));
        }
        assert!(prompt.contains("If you are unsure which tool fits, use DuckDuckGo Search."));
        assert!(prompt.contains("llama-3.3-70b-versatile"));
    }

    #[test]
    fn no_default_tool_hint_without_web_search() {
        let prompt = build_system_prompt(&ToolRegistry::new(), "m");
        assert!(!prompt.contains("If you are unsure"));
    }
}
