pub mod context;
pub mod injection_defense;
pub mod loop_;
pub mod step;
pub mod system_prompt;

pub use loop_::ReasoningLoop;

use crate::tools::ToolError;
use async_trait::async_trait;
use thiserror::Error;

/// Query-level failure surfaced to a frontend.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to save research output: {0}")]
    Persistence(#[source] ToolError),

    #[error("Unable to complete the request within {steps} steps")]
    IterationLimit {
        steps: u32,
        partial: Option<String>,
    },

    #[error("Inference unavailable: {0}")]
    Inference(String),
}

impl AgentError {
    /// Text shown to the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Self::IterationLimit {
                partial: Some(partial),
                ..
            } => format!("{}. Partial answer:\n{}", self, partial),
            _ => self.to_string(),
        }
    }
}

/// Anything that turns one query into one answer. Frontends depend on this.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, query: &str) -> Result<String, AgentError>;
}
