//! Configuration loading.
//!
//! Values are resolved in order: built-in defaults, the optional TOML file,
//! then environment variables (a `.env` file is honoured by `main`):
//! - `GROQ_API_KEY` - Required unless `api_key` is set in the file.
//! - `RESEARCH_API_URL` - Optional. OpenAI-compatible base URL.
//! - `RESEARCH_MODEL` - Optional. Model identifier.
//! - `RESEARCH_OUTPUT_FILE` - Optional. Destination of saved research.
//! - `RESEARCH_MAX_STEPS` - Optional. Model calls allowed per query.
//! - `RESEARCH_BIND` - Optional. Web form listen address.

pub mod schema;

pub use schema::ResearchConfig;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the inference credential.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key: set GROQ_API_KEY in the environment or .env file")]
    MissingApiKey,

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Default research-agent home directory (~/.research-agent).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".research-agent"))
        .unwrap_or_else(|| PathBuf::from(".research-agent"))
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("research.toml")
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<ResearchConfig, ConfigError> {
    if !path.exists() {
        return Ok(ResearchConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &ResearchConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config)?;
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    std::fs::write(path, contents).map_err(write_err)
}

/// Load the file, apply process environment overrides and validate.
///
/// This is the single startup entry point: a missing credential fails
/// here, before any query is accepted.
pub fn load(path: &Path) -> Result<ResearchConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests do not touch process state.
pub fn apply_env_overrides<F>(config: &mut ResearchConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(API_KEY_VAR) {
        config.api_key = key;
    }
    if let Some(url) = non_empty("RESEARCH_API_URL") {
        config.api_url = url;
    }
    if let Some(model) = non_empty("RESEARCH_MODEL") {
        config.model = model;
    }
    if let Some(file) = non_empty("RESEARCH_OUTPUT_FILE") {
        config.output_file = file;
    }
    if let Some(bind) = non_empty("RESEARCH_BIND") {
        config.bind_addr = bind;
    }
    if let Some(steps) = non_empty("RESEARCH_MAX_STEPS") {
        config.max_steps = steps.trim().parse().map_err(|e| {
            ConfigError::InvalidValue("RESEARCH_MAX_STEPS".into(), format!("{}", e))
        })?;
    }
    Ok(())
}

/// Check the invariants the rest of the crate relies on.
pub fn validate(config: &ResearchConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    if config.max_steps == 0 {
        return Err(ConfigError::InvalidValue(
            "max_steps".into(),
            "must be at least 1".into(),
        ));
    }
    if config.max_consecutive_errors == 0 {
        return Err(ConfigError::InvalidValue(
            "max_consecutive_errors".into(),
            "must be at least 1".into(),
        ));
    }
    if config.wikipedia_top_k == 0 {
        return Err(ConfigError::InvalidValue(
            "wikipedia_top_k".into(),
            "must be at least 1".into(),
        ));
    }
    if config.wikipedia_max_chars == 0 {
        return Err(ConfigError::InvalidValue(
            "wikipedia_max_chars".into(),
            "must be at least 1".into(),
        ));
    }
    if config.search_max_results == 0 {
        return Err(ConfigError::InvalidValue(
            "search_max_results".into(),
            "must be at least 1".into(),
        ));
    }
    if config.download_capacity == 0 {
        return Err(ConfigError::InvalidValue(
            "download_capacity".into(),
            "must be at least 1".into(),
        ));
    }
    if config.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue(
            "request_timeout_secs".into(),
            "must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let mut config = ResearchConfig::default();
        apply_env_overrides(&mut config, env(&[])).unwrap();
        assert!(matches!(validate(&config), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let mut config = ResearchConfig::default();
        apply_env_overrides(&mut config, env(&[(API_KEY_VAR, "   ")])).unwrap();
        assert!(matches!(validate(&config), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ResearchConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (API_KEY_VAR, "gsk_test"),
                ("RESEARCH_MODEL", "llama3-70b-8192"),
                ("RESEARCH_MAX_STEPS", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_key, "gsk_test");
        assert_eq!(config.model, "llama3-70b-8192");
        assert_eq!(config.max_steps, 4);
        validate(&config).unwrap();
    }

    #[test]
    fn non_numeric_max_steps_is_rejected() {
        let mut config = ResearchConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("RESEARCH_MAX_STEPS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "RESEARCH_MAX_STEPS"));
    }

    #[test]
    fn zero_max_steps_is_rejected() {
        let config = ResearchConfig {
            api_key: "k".into(),
            max_steps: 0,
            ..ResearchConfig::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::InvalidValue(..))));
    }

    #[test]
    fn zero_tool_budgets_are_rejected() {
        let base = ResearchConfig {
            api_key: "k".into(),
            ..ResearchConfig::default()
        };
        validate(&base).unwrap();

        let no_chars = ResearchConfig {
            wikipedia_max_chars: 0,
            ..base.clone()
        };
        assert!(matches!(
            validate(&no_chars),
            Err(ConfigError::InvalidValue(ref k, _)) if k == "wikipedia_max_chars"
        ));

        let no_results = ResearchConfig {
            search_max_results: 0,
            ..base
        };
        assert!(matches!(
            validate(&no_results),
            Err(ConfigError::InvalidValue(ref k, _)) if k == "search_max_results"
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.max_steps, ResearchConfig::default().max_steps);
        assert_eq!(config.output_file, "research_output.txt");
    }

    #[test]
    fn save_then_load_keeps_partial_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("research.toml");
        let config = ResearchConfig {
            model: "mixtral-8x7b-32768".into(),
            max_steps: 6,
            ..ResearchConfig::default()
        };
        save_config(&config, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("api_key"));

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.model, "mixtral-8x7b-32768");
        assert_eq!(loaded.max_steps, 6);
        assert_eq!(loaded.wikipedia_max_chars, 1000);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("research.toml");
        std::fs::write(&path, "max_steps = \"ten\"").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
