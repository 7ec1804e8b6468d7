//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `STUDIO_RESERVATIONS`
//! prefix and `__` between nested keys. Every section has defaults, so an
//! empty environment yields an in-memory setup with a two-hour promotion
//! lead time.
//!
//! # Example
//!
//! ```no_run
//! use studio_reservations::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod booking;
mod database;
mod error;
mod logging;

pub use booking::BookingRules;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection; in-memory stores when no URL is set
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Reservation engine tunables
    #[serde(default)]
    pub booking: BookingRules,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads variables such as
    /// `STUDIO_RESERVATIONS__DATABASE__URL` or
    /// `STUDIO_RESERVATIONS__BOOKING__PROMOTION_LEAD_TIME_MINUTES`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STUDIO_RESERVATIONS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.booking.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
