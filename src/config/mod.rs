//! Configuration management for m3u8proxy
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. `PORT` (listening port only, highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use m3u8proxy::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Proxy listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `M3U8PROXY__<section>__<key>`
//!
//! Examples:
//! - `M3U8PROXY__SERVER__BIND_ADDR=127.0.0.1:8080`
//! - `M3U8PROXY__SERVER__PUBLIC_BASE_URL=https://proxy.example.com`
//! - `M3U8PROXY__UPSTREAM__MEDIA_TIMEOUT_SECS=60`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/m3u8proxy.toml`.
//! This can be overridden using the `M3U8PROXY_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, LimitsConfig, ServerConfig, TelemetryConfig, UpstreamConfig};
pub use sources::apply_port_override;
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed, `PORT` is not
    /// a valid port number, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Config::load`] with an explicit configuration file path.
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, ignoring `PORT`
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
