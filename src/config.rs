//! Configuration management for the fleet reports server

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default number of inspections merged into one output document
pub const DEFAULT_CHUNK_SIZE: usize = 80;

/// Default wall-clock budget for a single export request
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Populate an empty database with a demo fleet on startup
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Inspections per merged document
    pub chunk_size: usize,
    pub timeout_secs: u64,
}

impl ExportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./fleet.db".to_string(),
                max_connections: 5,
                seed_demo_data: false,
            },
            export: ExportConfig {
                chunk_size: DEFAULT_CHUNK_SIZE,
                timeout_secs: DEFAULT_EXPORT_TIMEOUT_SECS,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./fleet.db".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
                seed_demo_data: parse_var("SEED_DEMO_DATA", false)?,
            },
            export: ExportConfig {
                chunk_size: parse_var("EXPORT_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
                timeout_secs: parse_var("EXPORT_TIMEOUT_SECS", DEFAULT_EXPORT_TIMEOUT_SECS)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.export.chunk_size == 0 {
            return Err(ConfigError::Zero("EXPORT_CHUNK_SIZE"));
        }
        if self.export.timeout_secs == 0 {
            return Err(ConfigError::Zero("EXPORT_TIMEOUT_SECS"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Zero("DATABASE_MAX_CONNECTIONS"));
        }
        Ok(())
    }
}

/// Read an optional variable, falling back to `default` when unset
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_value(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
