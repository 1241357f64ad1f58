//! "Save to File" tool backed by the persistence sink.

use super::{Tool, ToolError};
use crate::persistence::PersistenceSink;
use async_trait::async_trait;

pub const NAME: &str = "Save to File";

const DESCRIPTION: &str = "Save research results or outputs to a local text file. \
Use this when asked to save anything or record information.";

pub struct SaveTool {
    sink: PersistenceSink,
}

impl SaveTool {
    pub fn new(sink: PersistenceSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for SaveTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The text to append to the research log"
                }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        if input.trim().is_empty() {
            return Err(ToolError::InvalidInput("nothing to save".into()));
        }
        Ok(self.sink.append(input, None).await?)
    }
}
