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

//! Environment-backed configuration for the Reelsmith service.
//!
//! Layout: `model.rs` (typed configuration sections), `loader.rs` (environment
//! lookup and assembly), `validate.rs` (value parsers), `defaults.rs` (fallbacks).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DotenvFile, EnvLookup, ProcessEnv};
pub use model::{
    CloudinaryConfig, CredentialConfig, LogFormatSetting, PollSettings, Secret, ServerConfig,
    ServiceConfig, SignatureAlgorithm, StagingConfig, VertexConfig,
};
