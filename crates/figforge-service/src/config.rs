//! # Service Configuration
//!
//! Configuration management for the configurator service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FIGFORGE_SHIPPING_CENTS=1500                                       │
//! │     FIGFORGE_RETRY_MODE=backoff                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/figforge/figforge.toml (Linux)                           │
//! │     ~/Library/Application Support/com.figforge.configurator/...        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10.00 shipping, manual retry, ./figforge.db                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # figforge.toml
//! [pricing]
//! flat_shipping_cents = 1000
//!
//! [reorder]
//! retry_mode = "manual"  # manual | backoff
//! max_attempts = 3
//! initial_backoff_ms = 250
//! max_backoff_ms = 5000
//!
//! [database]
//! path = "./figforge.db"
//! max_connections = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use figforge_core::{Money, FLAT_SHIPPING_CENTS};
use figforge_db::DbConfig;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Retry Mode
// =============================================================================

/// What happens when the store rejects a reorder save.
///
/// ## Mode Selection
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                        Retry Mode Behavior                              │
/// │                                                                         │
/// │  MANUAL (Default)                                                      │
/// │  ────────────────                                                      │
/// │  • One attempt per Save press                                          │
/// │  • Failure is reported at once, draft stays dirty                      │
/// │  • The admin decides: Save again or Reset                              │
/// │                                                                         │
/// │  BACKOFF                                                               │
/// │  ───────                                                               │
/// │  • Retryable failures are attempted again after an exponential delay   │
/// │  • Gives up after max_attempts, then behaves like MANUAL               │
/// │  • The in-flight flag stays set for the whole sequence                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    #[default]
    Manual,
    Backoff,
}

impl std::fmt::Display for RetryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryMode::Manual => write!(f, "manual"),
            RetryMode::Backoff => write!(f, "backoff"),
        }
    }
}

impl std::str::FromStr for RetryMode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" | "none" => Ok(RetryMode::Manual),
            "backoff" | "exponential" => Ok(RetryMode::Backoff),
            other => Err(ServiceError::InvalidConfig(format!(
                "Unknown retry mode: '{}'. Valid options: manual, backoff",
                other
            ))),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Flat shipping fee in cents, applied whenever anything is selected.
    #[serde(default = "default_shipping_cents")]
    pub flat_shipping_cents: i64,
}

fn default_shipping_cents() -> i64 {
    FLAT_SHIPPING_CENTS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            flat_shipping_cents: default_shipping_cents(),
        }
    }
}

// =============================================================================
// Reorder Settings
// =============================================================================

/// Reorder save settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderSettings {
    #[serde(default)]
    pub retry_mode: RetryMode,

    /// Attempts per save in backoff mode, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    250
}
fn default_max_backoff() -> u64 {
    5_000
}

impl Default for ReorderSettings {
    fn default() -> Self {
        ReorderSettings {
            retry_mode: RetryMode::default(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./figforge.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Main Service Configuration
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub reorder: ReorderSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl ServiceConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (figforge.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading service config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load service config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ServiceResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ServiceError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Service config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.pricing.flat_shipping_cents < 0 {
            return Err(ServiceError::InvalidConfig(
                "flat_shipping_cents cannot be negative".into(),
            ));
        }

        if self.reorder.max_attempts == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_attempts must be greater than 0".into(),
            ));
        }

        if self.reorder.initial_backoff_ms > self.reorder.max_backoff_ms {
            return Err(ServiceError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.reorder.initial_backoff_ms, self.reorder.max_backoff_ms
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(cents) = std::env::var("FIGFORGE_SHIPPING_CENTS") {
            match cents.parse::<i64>() {
                Ok(c) => {
                    debug!(cents = c, "Overriding shipping fee from environment");
                    self.pricing.flat_shipping_cents = c;
                }
                Err(_) => warn!(value = %cents, "Ignoring non-numeric FIGFORGE_SHIPPING_CENTS"),
            }
        }

        if let Ok(mode) = std::env::var("FIGFORGE_RETRY_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding retry mode from environment");
                    self.reorder.retry_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown retry mode in environment"),
            }
        }

        if let Ok(attempts) = std::env::var("FIGFORGE_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse::<u32>() {
                self.reorder.max_attempts = a;
            }
        }

        if let Ok(path) = std::env::var("FIGFORGE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "figforge", "configurator")
            .map(|dirs| dirs.config_dir().join("figforge.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the flat shipping fee.
    pub fn shipping(&self) -> Money {
        Money::from_cents(self.pricing.flat_shipping_cents)
    }

    /// Builds the database pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.reorder.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.reorder.max_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_mode_parsing() {
        assert_eq!("manual".parse::<RetryMode>().unwrap(), RetryMode::Manual);
        assert_eq!("BACKOFF".parse::<RetryMode>().unwrap(), RetryMode::Backoff);
        assert_eq!("exponential".parse::<RetryMode>().unwrap(), RetryMode::Backoff);
        assert!("sometimes".parse::<RetryMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.pricing.flat_shipping_cents, 1_000);
        assert_eq!(config.reorder.retry_mode, RetryMode::Manual);
        assert_eq!(config.reorder.max_attempts, 3);
        assert_eq!(config.shipping().cents(), 1_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServiceConfig::default();
        assert!(config.validate().is_ok());

        config.reorder.max_attempts = 0;
        assert!(config.validate().is_err());

        config.reorder.max_attempts = 2;
        config.reorder.initial_backoff_ms = 10_000;
        assert!(config.validate().is_err());

        config.reorder.initial_backoff_ms = 100;
        config.pricing.flat_shipping_cents = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [reorder]
            retry_mode = "backoff"
            "#,
        )
        .unwrap();

        assert_eq!(config.reorder.retry_mode, RetryMode::Backoff);
        assert_eq!(config.reorder.max_attempts, 3);
        assert_eq!(config.pricing.flat_shipping_cents, 1_000);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ServiceConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[pricing]"));
        assert!(toml_str.contains("[reorder]"));
        assert!(toml_str.contains("retry_mode = \"manual\""));
    }
}
