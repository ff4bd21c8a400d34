//! Configuration module
//!
//! Loaded from a TOML file; every section and field has a default, so a
//! missing file or a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::AllocationPolicy;
use crate::domain::inventory::AvailabilityThresholds;
use crate::domain::location::{Location, LocationCatalog};
use crate::infrastructure::crypto::ApiKeyEntry;
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::errors::InfraError;

const APP_DIR: &str = "foodtruck-booking";

/// Default config location: `<config_dir>/foodtruck-booking/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn default_data_path() -> String {
    dirs_next::data_dir()
        .map(|d| d.join(APP_DIR).join("foodtruck.db"))
        .unwrap_or_else(|| PathBuf::from("./foodtruck.db"))
        .to_string_lossy()
        .into_owned()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub booking: BookingConfig,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub backend: StorageBackend,
    /// SQLite file path
    pub path: String,
    /// Full connection URL; overrides `path` when set
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: default_data_path(),
            url: None,
            max_connections: 5,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        let mut cfg = DatabaseConfig::from_url(self.connection_url());
        if !cfg.url.contains(":memory:") {
            cfg.max_connections = self.max_connections.max(1);
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or any EnvFilter directive)
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub api_keys: Vec<ApiKeyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Bounded wait for a ledger key's lock before reporting contention
    pub lock_timeout_ms: u64,
    pub code_attempts: u32,
    pub almost_full_ratio: f64,
    pub limited_ratio: f64,
    /// Idle lock sweep period
    pub lock_eviction_secs: u64,
    pub max_units_per_product: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        let thresholds = AvailabilityThresholds::default();
        let policy = AllocationPolicy::default();
        Self {
            lock_timeout_ms: 2000,
            code_attempts: policy.code_attempts,
            almost_full_ratio: thresholds.almost_full_ratio,
            limited_ratio: thresholds.limited_ratio,
            lock_eviction_secs: 60,
            max_units_per_product: policy.max_units_per_product,
        }
    }
}

impl BookingConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn lock_eviction_interval(&self) -> Duration {
        Duration::from_secs(self.lock_eviction_secs)
    }

    pub fn thresholds(&self) -> AvailabilityThresholds {
        AvailabilityThresholds {
            almost_full_ratio: self.almost_full_ratio,
            limited_ratio: self.limited_ratio,
        }
    }

    pub fn policy(&self) -> AllocationPolicy {
        AllocationPolicy {
            max_units_per_product: self.max_units_per_product,
            code_attempts: self.code_attempts,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let cfg = Self::from_toml(&raw)?;
        Ok(cfg)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let cfg: Self = toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<(), InfraError> {
        if !self.booking.thresholds().is_valid() {
            return Err(InfraError::Config(format!(
                "booking thresholds must satisfy 0 < almost_full_ratio ({}) < limited_ratio ({}) < 1",
                self.booking.almost_full_ratio, self.booking.limited_ratio
            )));
        }
        if self.booking.lock_timeout_ms == 0 {
            return Err(InfraError::Config("booking.lock_timeout_ms must be > 0".into()));
        }
        if self.booking.code_attempts == 0 {
            return Err(InfraError::Config("booking.code_attempts must be > 0".into()));
        }
        if self.booking.lock_eviction_secs == 0 {
            return Err(InfraError::Config("booking.lock_eviction_secs must be > 0".into()));
        }
        for key in &self.security.api_keys {
            let h = &key.key_hash;
            if h.len() != 64 || !h.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(InfraError::Config(format!(
                    "api key '{}' must carry a SHA-256 hex digest",
                    key.name
                )));
            }
        }
        self.catalog()?;
        Ok(())
    }

    /// Build the location catalog (validates ids and schedules).
    pub fn catalog(&self) -> Result<LocationCatalog, InfraError> {
        LocationCatalog::new(self.locations.clone()).map_err(|e| InfraError::Config(e.to_string()))
    }
}
