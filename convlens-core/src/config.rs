//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/convlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/convlens/` (~/.config/convlens/)
//! - State/Logs: `$XDG_STATE_HOME/convlens/` (~/.local/state/convlens/)
//!
//! The conversation store itself is never created by convlens. Its location is
//! either given explicitly or found by walking [`StoreConfig::candidates`].

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the conversation store inside its application directory.
const STORE_APP_DIR: &str = "amazon-q";
const STORE_FILE: &str = "data.sqlite3";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Where to find the conversation store
    #[serde(default)]
    pub store: StoreConfig,

    /// Truncation widths and layout
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store location settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StoreConfig {
    /// Explicit store path; skips the search when set
    pub path: Option<PathBuf>,

    /// Ordered search list; replaces the built-in defaults when non-empty
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl StoreConfig {
    /// Ordered candidate locations, first existing file wins.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            default_store_candidates()
        } else {
            self.search_paths.clone()
        }
    }
}

/// Built-in store locations, in search order.
pub fn default_store_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let bases = [
        dirs::data_local_dir(),
        dirs::data_dir(),
        Some(home_dir().join(".local/share")),
    ];
    for base in bases.into_iter().flatten() {
        let candidate = base.join(STORE_APP_DIR).join(STORE_FILE);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Pick the store path: an explicit path always wins, otherwise the first
/// candidate that exists as a file.
pub fn locate_store(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
        .ok_or_else(|| Error::StoreNotFound {
            searched: candidates.to_vec(),
        })
}

/// Display widths used by the transcript renderer and report presenter
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Max characters of a user prompt
    #[serde(default = "default_prompt_width")]
    pub prompt_width: usize,

    /// Max characters of an assistant response
    #[serde(default = "default_response_width")]
    pub response_width: usize,

    /// Max characters of the first tool's command
    #[serde(default = "default_command_width")]
    pub command_width: usize,

    /// Width of section rules
    #[serde(default = "default_box_width")]
    pub box_width: usize,

    /// How many known directories to suggest when a lookup comes back empty
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Show the first tool's command under a tool-use turn
    #[serde(default = "default_true")]
    pub show_tool_detail: bool,

    /// Show the user's environment context (OS, working directory)
    #[serde(default)]
    pub show_context: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            prompt_width: default_prompt_width(),
            response_width: default_response_width(),
            command_width: default_command_width(),
            box_width: default_box_width(),
            suggestion_limit: default_suggestion_limit(),
            show_tool_detail: true,
            show_context: false,
        }
    }
}

fn default_prompt_width() -> usize {
    150
}

fn default_response_width() -> usize {
    200
}

fn default_command_width() -> usize {
    100
}

fn default_box_width() -> usize {
    60
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/convlens/config.toml` (~/.config/convlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("convlens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/convlens/` (~/.local/state/convlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("convlens")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("convlens.log")
    }

    /// Resolve the store path for this configuration, with an optional
    /// command-line override taking precedence over `[store] path`.
    pub fn resolve_store(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        let explicit = cli_override.or(self.store.path.as_deref());
        locate_store(explicit, &self.store.candidates())
    }
}
