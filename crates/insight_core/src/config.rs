//! Configuration for the insight service.
//!
//! Loads settings from a TOML file or uses defaults. Endpoint and model
//! can additionally be overridden through environment variables so the
//! CLI works against a non-default Ollama host without a config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Environment override for the Ollama base URL.
pub const ENV_OLLAMA_URL: &str = "INSIGHT_OLLAMA_URL";

/// Environment override for the model name.
pub const ENV_OLLAMA_MODEL: &str = "INSIGHT_OLLAMA_MODEL";

/// Ollama endpoint and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama host.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for analysis.
    #[serde(default = "default_model")]
    pub model: String,

    /// Connect timeout in milliseconds. Short and fixed: either the host
    /// is there or it is not.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds. Long and configurable: generation is
    /// slow on small hosts.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Whether to probe availability before issuing chat calls.
    #[serde(default = "default_healthcheck")]
    pub healthcheck_enabled: bool,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_read_timeout() -> u64 {
    30_000
}

fn default_healthcheck() -> bool {
    true
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
            healthcheck_enabled: default_healthcheck(),
        }
    }
}

impl OllamaConfig {
    /// Model-listing endpoint, used for availability probes.
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// Chat-completion endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached insight records.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_capacity() -> usize {
    128
}

fn default_cache_ttl() -> u64 {
    3_600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file is missing or malformed. Environment overrides are
    /// applied on top either way.
    pub fn load(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_OLLAMA_URL) {
            if !url.is_empty() {
                self.ollama.base_url = url;
            }
        }
        if let Ok(model) = std::env::var(ENV_OLLAMA_MODEL) {
            if !model.is_empty() {
                self.ollama.model = model;
            }
        }
    }
}
