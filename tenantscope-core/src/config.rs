//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tenantscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/tenantscope/` (~/.config/tenantscope/)
//! - Data: `$XDG_DATA_HOME/tenantscope/` (~/.local/share/tenantscope/)
//! - State/Logs: `$XDG_STATE_HOME/tenantscope/` (~/.local/state/tenantscope/)

use crate::analytics::engine::{DEFAULT_CONNECT_CAPACITY, DEFAULT_WORKBENCH_CAPACITY};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

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

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where the event log and allocation snapshot live
    #[serde(default)]
    pub data: DataConfig,

    /// Platform licence ceilings
    #[serde(default)]
    pub licences: LicenceConfig,

    /// Report defaults
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input file locations. Unset paths fall back to the data directory.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DataConfig {
    /// Usage event CSV
    pub events_path: Option<PathBuf>,
    /// Licence allocation CSV
    pub allocations_path: Option<PathBuf>,
}

impl DataConfig {
    /// Configured events path or `$XDG_DATA_HOME/tenantscope/events.csv`
    pub fn events_path(&self) -> PathBuf {
        self.events_path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("events.csv"))
    }

    /// Configured allocations path or `$XDG_DATA_HOME/tenantscope/allocations.csv`
    pub fn allocations_path(&self) -> PathBuf {
        self.allocations_path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("allocations.csv"))
    }
}

/// Fixed platform licence ceilings per component
#[derive(Debug, Deserialize, Clone)]
pub struct LicenceConfig {
    /// Component name to ceiling
    #[serde(default = "default_capacity")]
    pub capacity: BTreeMap<String, u64>,
}

impl Default for LicenceConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("Connect".to_string(), DEFAULT_CONNECT_CAPACITY),
        ("Workbench".to_string(), DEFAULT_WORKBENCH_CAPACITY),
    ])
}

/// Report defaults
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Trailing window length when no explicit dates are given
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Tenancies kept in the activity ranking
    #[serde(default = "default_top_tenancies")]
    pub top_tenancies: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            top_tenancies: default_top_tenancies(),
        }
    }
}

fn default_window_days() -> u32 {
    30
}

fn default_top_tenancies() -> usize {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
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

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.report.default_window_days == 0 {
            return Err(Error::Config(
                "report.default_window_days must be at least 1".to_string(),
            ));
        }
        if let Some((component, _)) = self.licences.capacity.iter().find(|(_, c)| **c == 0) {
            return Err(Error::Config(format!(
                "licences.capacity.{} must be greater than 0",
                component
            )));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/tenantscope/config.toml` (~/.config/tenantscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("tenantscope").join("config.toml")
    }

    /// Returns the data directory path (for input CSVs)
    ///
    /// `$XDG_DATA_HOME/tenantscope/` (~/.local/share/tenantscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("tenantscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/tenantscope/` (~/.local/state/tenantscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("tenantscope")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/tenantscope/tenantscope.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("tenantscope.log")
    }
}
