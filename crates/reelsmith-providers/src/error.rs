//! Errors raised while constructing provider adapters.

use thiserror::Error;

/// Result alias for adapter construction.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Adapter construction failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}
