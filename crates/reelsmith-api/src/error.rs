//! # Design
//!
//! - Single error type for binding and serving the API.
//! - Constant messages; the address and IO source travel as fields.

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving the API.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// Binding the listener failed.
    #[error("failed to bind api listener")]
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving terminated with an error.
    #[error("api server terminated unexpectedly")]
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn bind_error_keeps_address_and_source() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
        let err = ApiServerError::Bind {
            addr,
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(err.to_string(), "failed to bind api listener");
        assert!(err.source().is_some());
    }
}
