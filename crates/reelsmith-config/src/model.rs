//! Typed configuration sections assembled once at start-up.

use std::fmt::{self, Debug, Formatter};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Complete service configuration, constructed once and shared read-only.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Vertex AI model coordinates.
    pub vertex: VertexConfig,
    /// Access token sourcing.
    pub credentials: CredentialConfig,
    /// Cloudinary upload target.
    pub cloudinary: CloudinaryConfig,
    /// Operation polling policy.
    pub poll: PollSettings,
    /// Local staging directory for generated assets.
    pub staging: StagingConfig,
    /// Timeout applied to outbound HTTP calls.
    #[serde(serialize_with = "serialize_secs")]
    pub http_timeout: Duration,
    /// Requested log format, when overridden.
    pub log_format: Option<LogFormatSetting>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port to bind.
    pub port: u16,
}

impl ServerConfig {
    /// Socket address combining bind address and port.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Vertex AI model coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct VertexConfig {
    /// Google Cloud project identifier.
    pub project: String,
    /// Region hosting the model, e.g. `us-central1`.
    pub location: String,
    /// Publisher model identifier, e.g. `veo-2.0-generate-001`.
    pub model: String,
    /// API origin (regional endpoint unless overridden).
    pub base_url: String,
}

impl VertexConfig {
    /// Fully qualified model resource name.
    #[must_use]
    pub fn model_resource(&self) -> String {
        format!(
            "projects/{}/locations/{}/publishers/google/models/{}",
            self.project, self.location, self.model
        )
    }
}

/// Access token sourcing.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialConfig {
    /// Pre-minted bearer token; skips the gcloud CLI when present.
    pub static_token: Option<Secret>,
    /// Service account key file handed to gcloud.
    pub credentials_file: Option<PathBuf>,
    /// gcloud executable.
    pub gcloud_bin: String,
}

/// Cloudinary upload target.
#[derive(Debug, Clone, Serialize)]
pub struct CloudinaryConfig {
    /// Account cloud name.
    pub cloud_name: String,
    /// Public API key.
    pub api_key: String,
    /// API secret used to sign uploads.
    pub api_secret: Secret,
    /// API origin.
    pub base_url: String,
    /// Destination folder.
    pub folder: String,
    /// Cloudinary resource type.
    pub resource_type: String,
    /// Digest used for upload signatures.
    pub signature_algorithm: SignatureAlgorithm,
}

/// Digest algorithm used to sign Cloudinary uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// SHA-1 (Cloudinary default).
    Sha1,
    /// SHA-256.
    Sha256,
}

impl SignatureAlgorithm {
    /// Parse the environment representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Operation polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollSettings {
    /// Base delay multiplied by the attempt number.
    #[serde(serialize_with = "serialize_millis")]
    pub base_delay: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

/// Local staging directory for generated assets.
#[derive(Debug, Clone, Serialize)]
pub struct StagingConfig {
    /// Directory receiving staged files.
    pub dir: PathBuf,
}

/// Log format override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// String wrapper that never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Borrow the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Secret {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("Secret(***)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}
