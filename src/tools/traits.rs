//! Tool trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Failure inside a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned an error: {message}")]
    Backend { service: String, message: String },

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Whether the loop may feed this back to the model and carry on.
    ///
    /// Local write failures are not: the user asked for something to be
    /// recorded and must learn that it was not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    pub(crate) fn backend(service: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

/// A named capability the model may call with one string argument.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in function calls). Unique within a registry.
    fn name(&self) -> &str;

    /// Human-readable description; the model's only hint about when to use it.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The query or text to pass to the tool"
                }
            },
            "required": ["input"]
        })
    }

    /// Execute the tool with the given argument.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;

    /// Function definition sent to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
