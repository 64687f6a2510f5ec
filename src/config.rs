//! Configuration for redraft.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (REDRAFT_API_URL, REDRAFT_MODEL, and the API key
//!    variable, OPENAI_API_KEY by default)
//! 2. Config file (.redraft/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .redraft/config.yaml
//! - Falls back to ~/.redraft/config.yaml

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::openai::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::core::EngineLimits;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Environment variable holding the API key unless the config overrides it
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub generation: Option<GenerationConfig>,
    #[serde(default)]
    pub limits: Option<EngineLimits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completions endpoint
    pub api_url: Option<String>,
    /// Model used for refinement passes
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Chat-completions endpoint
    pub api_url: String,
    /// Model used for refinement passes
    pub model: String,
    /// Environment variable the API key is read from
    pub api_key_env: String,
    /// Engine limits (timeouts, context cap, retries)
    pub limits: EngineLimits,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).with_context(|| {
            format!(
                "{} is not set in the environment (needed for generation calls)",
                self.api_key_env
            )
        })
    }
}

/// Find config file by searching current directory and parents,
/// then the home directory
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".redraft").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(".redraft").join("config.yaml");
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let (mut api_url, mut model, mut api_key_env, limits) =
        if let Some(ref config_path) = config_file {
            let config = load_config_file(config_path)?;
            let generation = config.generation.unwrap_or_default();
            (
                generation.api_url,
                generation.model,
                generation.api_key_env,
                config.limits.unwrap_or_default(),
            )
        } else {
            (None, None, None, EngineLimits::default())
        };

    // Environment variables win over the config file
    if let Ok(env_url) = std::env::var("REDRAFT_API_URL") {
        api_url = Some(env_url);
    }
    if let Ok(env_model) = std::env::var("REDRAFT_MODEL") {
        model = Some(env_model);
    }
    if let Ok(env_key_var) = std::env::var("REDRAFT_API_KEY_ENV") {
        api_key_env = Some(env_key_var);
    }

    Ok(ResolvedConfig {
        api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        api_key_env: api_key_env.unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
        limits,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Redact an API key for display: first and last few characters only
pub fn redacted(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}
