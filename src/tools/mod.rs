pub mod save;
pub mod traits;
pub mod web_search;
pub mod wikipedia;

pub use save::SaveTool;
pub use traits::{Tool, ToolDefinition, ToolError};
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

use crate::config::ResearchConfig;
use crate::persistence::PersistenceSink;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// User agent for outbound tool requests. Wikipedia rejects anonymous clients.
const USER_AGENT: &str = concat!("research-agent/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Tool name must not be empty")]
    EmptyName,

    #[error("Tool '{0}' has an empty description")]
    EmptyDescription(String),

    #[error("Tool '{0}' is already registered")]
    Duplicate(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Fixed, ordered set of tools. Built once at startup, read-only after.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names are unique; name and description must be non-empty.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if tool.description().trim().is_empty() {
            return Err(RegistryError::EmptyDescription(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        debug!("Registered tool '{}'", name);
        self.index.insert(name.to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Tools in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Function definitions for the inference API.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Standard tool set
// ---------------------------------------------------------------------------

/// Build the registry every frontend uses: Wikipedia, web search, save.
pub fn build_registry(
    config: &ResearchConfig,
    sink: PersistenceSink,
) -> Result<ToolRegistry, RegistryError> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout())
        .build()?;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WikipediaTool::new(
        &config.wikipedia_api_url,
        config.wikipedia_top_k,
        config.wikipedia_max_chars,
        http.clone(),
    )))?;
    registry.register(Arc::new(WebSearchTool::new(
        &config.duckduckgo_url,
        config.search_max_results,
        http,
    )))?;
    registry.register(Arc::new(SaveTool::new(sink)))?;
    Ok(registry)
}
