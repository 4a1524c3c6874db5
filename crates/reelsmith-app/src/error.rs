//! # Design
//!
//! - Centralize bootstrap errors in one type.
//! - Keep error messages constant while carrying the failed operation as a field.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: reelsmith_config::ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: reelsmith_telemetry::TelemetryError,
    },
    /// A provider adapter could not be built.
    #[error("provider construction failed")]
    Provider {
        /// Operation identifier.
        operation: &'static str,
        /// Source provider error.
        source: reelsmith_providers::ProviderError,
    },
    /// The API server failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: reelsmith_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: reelsmith_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: reelsmith_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn provider(
        operation: &'static str,
        source: reelsmith_providers::ProviderError,
    ) -> Self {
        Self::Provider { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: reelsmith_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
