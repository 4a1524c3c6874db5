//! HTTP handlers and middleware.

pub(crate) mod constants;
pub(crate) mod dto;
pub(crate) mod errors;
pub(crate) mod generate;
pub(crate) mod health;
pub(crate) mod router;
pub(crate) mod telemetry;
