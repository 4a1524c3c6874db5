//! # Design
//!
//! - Keep error messages constant; name the offending variable in structured fields.
//! - Never carry secret values in error context.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set or was blank.
    #[error("missing configuration value")]
    MissingField {
        /// Environment variable name.
        name: &'static str,
    },
    /// An environment variable contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment variable name.
        field: &'static str,
        /// Offending value when it is safe to echo.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A `.env` file was present but could not be read or parsed.
    #[error("failed to load .env file")]
    EnvFile {
        /// Underlying dotenv error.
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    /// Name of the environment variable the error refers to, or `.env` for file errors.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { name } => name,
            Self::InvalidField { field, .. } => field,
            Self::EnvFile { .. } => ".env",
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
