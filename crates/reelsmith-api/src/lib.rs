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

//! HTTP API exposing the generation workflow.
//!
//! Layout: `http/router.rs` (server and middleware stack), `http/generate.rs`
//! (generation endpoint), `http/health.rs` (status, health and metrics),
//! `http/dto.rs` (request/response bodies), `http/errors.rs` (error responses),
//! `http/telemetry.rs` (per-route request counting), `state.rs` (shared state),
//! `error.rs` (server errors).

pub mod error;
pub(crate) mod http;
pub(crate) mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
