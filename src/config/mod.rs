//! Configuration management
//!
//! This module handles loading and parsing configuration for the course catalog service.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Domain service configuration
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

/// Database configuration
///
/// SQLite uses `url` (a file path, `sqlite:` URL or `:memory:`).
/// PostgreSQL uses the discrete connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or postgres)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// SQLite database location
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pg_host")]
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    #[serde(default = "default_pg_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Database name
    #[serde(default = "default_pg_name")]
    pub name: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            host: default_pg_host(),
            port: default_pg_port(),
            user: default_pg_user(),
            password: String::new(),
            name: default_pg_name(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/catalog.db".to_string()
}

fn default_pg_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_user() -> String {
    "postgres".to_string()
}

fn default_pg_name() -> String {
    "courses".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// PostgreSQL
    Postgres,
}

impl std::str::FromStr for DatabaseDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::ValidationError(format!(
                "unknown database driver: {}",
                other
            ))),
        }
    }
}

/// Domain service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deadline applied to every store interaction, in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl ServiceConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn default_call_timeout_ms() -> u64 {
    2000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognized variables:
    /// - CATALOG_SERVER_HOST, CATALOG_SERVER_PORT (or GRPC_PORT)
    /// - CATALOG_DATABASE_DRIVER, CATALOG_DATABASE_URL, CATALOG_DATABASE_MAX_CONNECTIONS
    /// - POSTGRES_HOST, POSTGRES_PORT, POSTGRES_USER, POSTGRES_PASSWORD, POSTGRES_DB
    /// - CATALOG_CALL_TIMEOUT_MS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.service.call_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "service.call_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CATALOG_SERVER_HOST") {
            self.server.host = host;
        }
        // GRPC_PORT may be written as ":50051"
        for key in ["GRPC_PORT", "CATALOG_SERVER_PORT"] {
            if let Ok(port) = std::env::var(key) {
                if let Ok(port) = port.trim_start_matches(':').parse::<u16>() {
                    self.server.port = port;
                }
            }
        }

        match std::env::var("CATALOG_DATABASE_DRIVER") {
            Ok(driver) => {
                if let Ok(driver) = driver.parse() {
                    self.database.driver = driver;
                }
            }
            // The deployment environment names only the Postgres host
            Err(_) if std::env::var_os("POSTGRES_HOST").is_some() => {
                if self.database.driver != DatabaseDriver::Postgres {
                    tracing::info!("POSTGRES_HOST is set, switching database driver to postgres");
                    self.database.driver = DatabaseDriver::Postgres;
                }
            }
            Err(_) => {}
        }
        if let Ok(url) = std::env::var("CATALOG_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("CATALOG_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }
        if let Ok(host) = std::env::var("POSTGRES_HOST") {
            self.database.host = host;
        }
        if let Ok(port) = std::env::var("POSTGRES_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.database.port = port;
            }
        }
        if let Ok(user) = std::env::var("POSTGRES_USER") {
            self.database.user = user;
        }
        if let Ok(password) = std::env::var("POSTGRES_PASSWORD") {
            self.database.password = password;
        }
        if let Ok(name) = std::env::var("POSTGRES_DB") {
            self.database.name = name;
        }

        if let Ok(ms) = std::env::var("CATALOG_CALL_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                self.service.call_timeout_ms = ms;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Config tests that touch the process environment share this lock.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
