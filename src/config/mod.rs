//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SESSION_MONITOR` prefix and nested values use double underscores as separators.
//! Every setting has a default, so an empty environment loads successfully.
//!
//! # Example
//!
//! ```no_run
//! use session_monitor::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! config.logging.init_tracing();
//! ```

mod error;
mod feed;
mod logging;

pub use error::{ConfigError, ValidationError};
pub use feed::{FeedConfig, MAX_CHANNEL_CAPACITY};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Event feed configuration (per-session buffering)
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging configuration (filter, output format)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SESSION_MONITOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SESSION_MONITOR__FEED__CHANNEL_CAPACITY=256` -> `feed.channel_capacity = 256`
    /// - `SESSION_MONITOR__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SESSION_MONITOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if a loaded value is out of range.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.feed.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
