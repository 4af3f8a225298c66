use crate::core::{Result, StoreError};
use crate::store::StoreConfig;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub mod database;

pub use database::DatabaseConfig;

/// Process configuration for the `record-store` binary
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// YAML file listing store bindings
    pub stores_file: Option<PathBuf>,
}

impl AppConfig {
    /// Tracing filter used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> String {
        format!("record_store={}", self.log_level)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                stores_file: env::var("RECORD_STORES_FILE").ok().map(PathBuf::from),
            },
            database: DatabaseConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(StoreError::Configuration(
                "Database max connections must be greater than 0".to_string(),
            ));
        }

        if self.database.pool_size == 0 {
            return Err(StoreError::Configuration(
                "Database pool size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Store bindings from `RECORD_STORES_FILE`, empty when unset
    pub fn load_stores(&self) -> Result<Vec<StoreConfig>> {
        let Some(path) = &self.app.stores_file else {
            return Ok(Vec::new());
        };

        let source = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        StoreConfig::list_from_yaml(&source)
    }
}
