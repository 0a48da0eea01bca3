//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                    │
//! │     storefront --db ./other.db ...                                     │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     STOREFRONT_DB_PATH=./data/storefront.db                            │
//! │     STOREFRONT_VIP_DISCOUNT_BPS=1500                                   │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config PATH, or storefront.toml in the platform config dir      │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./storefront.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [store]
//! default_location_id = 1
//! vip_discount_bps = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use storefront_core::{DEFAULT_LOCATION_ID, DEFAULT_VIP_DISCOUNT_BPS};
use storefront_db::{CoordinatorConfig, DbConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first use.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the lock before reporting busy.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./storefront.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Location whose stock sales and purchases move.
    #[serde(default = "default_location_id")]
    pub default_location_id: i64,

    /// VIP discount in basis points (1000 = 10%).
    #[serde(default = "default_vip_discount")]
    pub vip_discount_bps: u32,
}

fn default_location_id() -> i64 {
    DEFAULT_LOCATION_ID
}

fn default_vip_discount() -> u32 {
    DEFAULT_VIP_DISCOUNT_BPS
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            default_location_id: default_location_id(),
            vip_discount_bps: default_vip_discount(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the platform default is optional.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                path => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.store.default_location_id <= 0 {
            return Err(ConfigError::Invalid(
                "store.default_location_id must be positive".into(),
            ));
        }
        if self.store.vip_discount_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "store.vip_discount_bps must be at most 10000, got {}",
                self.store.vip_discount_bps
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOREFRONT_*` overrides read through `lookup`.
    /// Unparseable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STOREFRONT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("STOREFRONT_MAX_CONNECTIONS") {
            match raw.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %raw, "Ignoring invalid STOREFRONT_MAX_CONNECTIONS"),
            }
        }

        if let Some(raw) = lookup("STOREFRONT_LOCATION_ID") {
            match raw.parse() {
                Ok(id) => self.store.default_location_id = id,
                Err(_) => warn!(value = %raw, "Ignoring invalid STOREFRONT_LOCATION_ID"),
            }
        }

        if let Some(raw) = lookup("STOREFRONT_VIP_DISCOUNT_BPS") {
            match raw.parse() {
                Ok(bps) => self.store.vip_discount_bps = bps,
                Err(_) => warn!(value = %raw, "Ignoring invalid STOREFRONT_VIP_DISCOUNT_BPS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            location_id: self.store.default_location_id,
            vip_discount_bps: self.store.vip_discount_bps,
            ..CoordinatorConfig::default()
        }
    }
}
