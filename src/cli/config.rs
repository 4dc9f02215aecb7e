//! Configuration management for docbuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.docbuddy/config.toml

use crate::agent::DEFAULT_MAX_ITERATIONS;
use crate::errors::{AgentError, Result};
use crate::retrieval::engine::{DEFAULT_SNIPPET_CHARS, DEFAULT_TOP_K};
use crate::retrieval::SearchParams;
use crate::streaming::client::{DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT};
use crate::streaming::SamplingOptions;
use crate::tools::implementations::{EXPLAIN_TERM_TOOL, LIST_DOCS_TOOL, SEARCH_TOOL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the home directory holding config and state
pub const CONFIG_DIR: &str = ".docbuddy";

/// Complete configuration for docbuddy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub agent: AgentSettings,
    pub retrieval: RetrievalConfig,
    pub corpus: CorpusConfig,
    pub telemetry: TelemetryConfig,
}

/// Ollama connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub temperature: f32,
    pub num_predict: i32,
    pub request_timeout_secs: u64,
}

/// Control loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    /// Tools offered to the model, in prompt order
    pub allowed_tools: Vec<String>,
}

/// Retrieval defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub snippet_chars: usize,
}

/// Corpus source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON corpus file; the built-in corpus is used when unset
    pub path: Option<String>,
}

/// Terminal display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub show_spinner: bool,
    pub color_output: bool,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        let sampling = SamplingOptions::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            model: DEFAULT_MODEL.to_string(),
            temperature: sampling.temperature,
            num_predict: sampling.num_predict,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            allowed_tools: vec![
                SEARCH_TOOL.to_string(),
                LIST_DOCS_TOOL.to_string(),
                EXPLAIN_TERM_TOOL.to_string(),
            ],
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_TOP_K,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            show_spinner: true,
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AgentError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AgentError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from ~/.docbuddy/config.toml or use built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Config::default()),
        }
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(AgentError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        if self.retrieval.default_k == 0 {
            return Err(AgentError::ConfigError(
                "default_k must be at least 1".to_string(),
            ));
        }

        if self.retrieval.snippet_chars == 0 {
            return Err(AgentError::ConfigError(
                "snippet_chars must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(AgentError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.agent.allowed_tools.is_empty() {
            return Err(AgentError::ConfigError(
                "allowed_tools must name at least one tool".to_string(),
            ));
        }

        match self.telemetry.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            _ => {
                return Err(AgentError::ConfigError(format!(
                    "Invalid verbosity level: {}",
                    self.telemetry.default_verbosity
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgentError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgentError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Pretty TOML rendering
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AgentError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.request_timeout_secs)
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            temperature: self.ollama.temperature,
            num_predict: self.ollama.num_predict,
        }
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            top_k: self.retrieval.default_k,
            snippet_chars: self.retrieval.snippet_chars,
        }
    }

    /// Corpus file with `~` expanded, if configured
    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.corpus.path.as_deref().map(Self::expand_path)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "127.0.0.1");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.agent.max_iterations, 6);
        assert_eq!(config.retrieval.default_k, 3);
        assert_eq!(config.retrieval.snippet_chars, 240);
        assert_eq!(config.agent.allowed_tools.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.default_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.snippet_chars = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ollama.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.default_verbosity = "loud".to_string();
        assert!(matches!(config.validate(), Err(AgentError::ConfigError(_))));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[agent]\nmax_iterations = 4\n\n[corpus]\npath = \"/data/docs.json\""
        )
        .unwrap();

        let config = Config::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.agent.allowed_tools.len(), 3);
        assert_eq!(config.corpus_path(), Some(PathBuf::from("/data/docs.json")));
        assert_eq!(config.ollama.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ndefault_k = 0").unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nmax_iterations = ").unwrap();
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ollama.model = "llama3:8b".to_string();
        config.save(&path).unwrap();

        let reloaded = Config::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_derived_values() {
        let config = Config::default();
        assert_eq!(config.ollama_url(), "http://127.0.0.1:11434");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.search_params().top_k, 3);
        assert_eq!(config.corpus_path(), None);
    }

    #[test]
    fn test_expand_path() {
        assert!(!Config::expand_path("~/.docbuddy").to_string_lossy().contains('~'));
        assert_eq!(
            Config::expand_path("/absolute/path").to_string_lossy(),
            "/absolute/path"
        );
    }
}
