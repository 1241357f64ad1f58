//! Configuration schema for research.toml.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// OpenAI-compatible inference base URL (Groq by default).
    pub api_url: String,

    /// Inference API key. Usually supplied through `GROQ_API_KEY`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Model identifier passed to the inference API.
    pub model: String,

    /// Maximum tokens per model response.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Maximum model calls per query before giving up.
    pub max_steps: u32,

    /// Consecutive failed model calls that abort a query.
    pub max_consecutive_errors: u32,

    /// Retries per inference request on transport errors, 429 and 5xx.
    pub max_retries: u32,

    /// Timeout applied to every outbound HTTP request.
    pub request_timeout_secs: u64,

    /// Default destination of the "Save to File" tool.
    pub output_file: String,

    /// MediaWiki API endpoint.
    pub wikipedia_api_url: String,

    /// Number of Wikipedia pages to summarize.
    pub wikipedia_top_k: usize,

    /// Character budget for the Wikipedia tool output.
    pub wikipedia_max_chars: usize,

    /// DuckDuckGo HTML endpoint.
    pub duckduckgo_url: String,

    /// Number of search results kept from a DuckDuckGo page.
    pub search_max_results: usize,

    /// Web form listen address.
    pub bind_addr: String,

    /// Answers kept around for the web form's download link.
    pub download_capacity: usize,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1".into(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".into(),
            max_tokens: 2048,
            temperature: 0.0,
            max_steps: 10,
            max_consecutive_errors: 3,
            max_retries: 2,
            request_timeout_secs: 60,
            output_file: "research_output.txt".into(),
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".into(),
            wikipedia_top_k: 1,
            wikipedia_max_chars: 1000,
            duckduckgo_url: "https://html.duckduckgo.com/html/".into(),
            search_max_results: 5,
            bind_addr: "127.0.0.1:8501".into(),
            download_capacity: 64,
            log_level: "info".into(),
        }
    }
}

impl ResearchConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved output file for saved research.
    pub fn resolved_output_file(&self) -> String {
        self.resolve_path(&self.output_file)
    }

    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
