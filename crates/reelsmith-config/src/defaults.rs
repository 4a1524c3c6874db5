//! Default values applied when optional environment variables are absent.
//!
//! # Design
//! - Keep every fallback in one place so the loader and tests agree.
//! - Poll defaults match the provider guidance of a 2s linear step over 15 attempts.

use std::net::{IpAddr, Ipv4Addr};

/// Default listen port for the HTTP surface.
pub const HTTP_PORT: u16 = 3000;
/// Default bind address for the HTTP surface.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
/// Base delay multiplied by the attempt number between polls.
pub const POLL_BASE_DELAY_MS: u64 = 2_000;
/// Maximum number of status checks before a workflow times out.
pub const POLL_MAX_ATTEMPTS: u32 = 15;
/// Timeout applied to every outbound HTTP request.
pub const HTTP_TIMEOUT_SECS: u64 = 120;
/// Binary used to mint access tokens when no static token is configured.
pub const GCLOUD_BIN: &str = "gcloud";
/// Cloudinary API origin.
pub const CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";
/// Folder receiving uploaded videos.
pub const CLOUDINARY_FOLDER: &str = "veo2_generated_videos";
/// Cloudinary resource type for uploaded assets.
pub const CLOUDINARY_RESOURCE_TYPE: &str = "video";

/// Vertex AI origin for the supplied region.
#[must_use]
pub fn vertex_base_url(location: &str) -> String {
    format!("https://{location}-aiplatform.googleapis.com")
}
