#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Reelsmith service bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `error.rs` (application errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level error types.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
