//! Configuration management for refill
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/refill/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{RefillError, Result};

/// Main configuration for refill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillConfig {
    /// Replay engine timing
    pub replay: ReplayConfig,
    /// Cross-navigation coordinator behavior
    pub coordinator: CoordinatorConfig,
    /// Script store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Whether to show debug output
    #[serde(default)]
    pub debug: bool,
}

/// Replay engine timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// How long a step waits for its element to appear, in ms
    pub element_timeout_ms: u64,
    /// Quiet window after a click before moving on, in ms
    pub click_quiet_ms: u64,
    /// Quiet window after a fill before moving on, in ms
    pub fill_quiet_ms: u64,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Delay after a same-site navigation before probing the new page, in ms
    pub settle_delay_ms: u64,
}

/// Script store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the script directory; defaults to the platform data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            replay: ReplayConfig::default(),
            coordinator: CoordinatorConfig::default(),
            storage: StorageConfig::default(),
            debug: env::var("REFILL_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: env_ms("REFILL_ELEMENT_TIMEOUT_MS", 3000),
            click_quiet_ms: env_ms("REFILL_CLICK_QUIET_MS", 300),
            fill_quiet_ms: env_ms("REFILL_FILL_QUIET_MS", 150),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: env_ms("REFILL_SETTLE_DELAY_MS", 400),
        }
    }
}

fn env_ms(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ReplayConfig {
    /// Element wait bound as a duration
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    /// Post-click quiet window as a duration
    pub fn click_quiet(&self) -> Duration {
        Duration::from_millis(self.click_quiet_ms)
    }

    /// Post-fill quiet window as a duration
    pub fn fill_quiet(&self) -> Duration {
        Duration::from_millis(self.fill_quiet_ms)
    }
}

impl CoordinatorConfig {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl RefillConfig {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refill")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Try to load from config file
        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(RefillError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| RefillError::config(format!("Failed to read config: {}", e)))?;

        let config: RefillConfig = toml::from_str(&content)
            .map_err(|e| RefillError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| RefillError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RefillError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| RefillError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = RefillConfig::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
