//! Shared HTTP constants.

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
pub(crate) const STATUS_LINE: &str = "Reelsmith video generation service is running.";
