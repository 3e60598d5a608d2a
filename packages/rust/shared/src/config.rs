//! Application configuration for nbcheck.
//!
//! User config lives at `~/.nbcheck/nbcheck.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbcheckError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbcheck.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbcheck";

// ---------------------------------------------------------------------------
// Config structs (matching nbcheck.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Validation rules.
    #[serde(default)]
    pub checks: ChecksConfig,

    /// How directory arguments are expanded into notebooks.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// External command used by `--execute`.
    #[serde(default)]
    pub execute: ExecuteConfig,
}

/// `[checks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Error kinds that mark an intentionally unfinished exercise.
    #[serde(default = "default_placeholder_errors")]
    pub placeholder_errors: Vec<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            placeholder_errors: default_placeholder_errors(),
        }
    }
}

fn default_placeholder_errors() -> Vec<String> {
    vec!["NotImplementedError".into()]
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Glob applied below each directory argument.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Regexes; matching paths are skipped.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            exclude: default_exclude(),
        }
    }
}

fn default_pattern() -> String {
    "**/*.ipynb".into()
}
fn default_exclude() -> Vec<String> {
    vec![r"\.ipynb_checkpoints".into()]
}

/// `[execute]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteConfig {
    /// Program to run.
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments passed before the notebook path.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Per-notebook wall clock limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_command() -> String {
    "jupyter".into()
}
fn default_args() -> Vec<String> {
    [
        "nbconvert",
        "--to",
        "notebook",
        "--execute",
        "--allow-errors",
        "--stdout",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_timeout_secs() -> u64 {
    600
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbcheck/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NbcheckError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbcheck/nbcheck.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbcheckError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NbcheckError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbcheckError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbcheckError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbcheckError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings that would make every run meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.execute.command.trim().is_empty() {
        return Err(NbcheckError::config("execute.command must not be empty"));
    }
    if config.execute.timeout_secs == 0 {
        return Err(NbcheckError::config(
            "execute.timeout_secs must be greater than zero",
        ));
    }
    if config.discovery.pattern.trim().is_empty() {
        return Err(NbcheckError::config("discovery.pattern must not be empty"));
    }
    Ok(())
}
