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

//! Adapters binding the core workflow traits to concrete services.
//! Layout: vertex.rs (generation provider), credentials.rs (token sources),
//! cloudinary.rs (storage publisher), http.rs (shared client helpers), error.rs.

pub mod cloudinary;
pub mod credentials;
pub mod error;
mod http;
pub mod vertex;

pub use cloudinary::{CloudinaryPublisher, sign_params};
pub use credentials::{GcloudCliCredentials, StaticTokenCredentials, credential_provider};
pub use error::{ProviderError, ProviderResult};
pub use http::build_client;
pub use vertex::VertexClient;
