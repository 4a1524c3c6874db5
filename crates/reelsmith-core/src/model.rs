//! Domain types exchanged between the workflow and its collaborators.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Aspect ratio applied when the caller does not supply one.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
/// Clip length applied when the caller does not supply one.
pub const DEFAULT_DURATION_SECONDS: u32 = 4;

/// Unvalidated generation parameters as received from a caller.
///
/// Duration is kept textual so that numeric and string inputs share one
/// validation path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationDraft {
    /// Free-text prompt.
    pub prompt: Option<String>,
    /// Requested aspect ratio (`W:H`).
    pub aspect_ratio: Option<String>,
    /// Requested duration in whole seconds.
    pub duration_seconds: Option<String>,
}

impl GenerationDraft {
    /// Draft carrying only a prompt.
    #[must_use]
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Apply defaults and validate every field.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<GenerationRequest, ValidationError> {
        let prompt = self
            .prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .ok_or(ValidationError::MissingPrompt)?;
        let mut request = GenerationRequest::new(prompt)?;
        if let Some(aspect_ratio) = self.aspect_ratio {
            request = request.with_aspect_ratio(aspect_ratio)?;
        }
        if let Some(duration) = self.duration_seconds {
            let trimmed = duration.trim();
            let seconds = trimmed
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidDuration {
                    value: duration.clone(),
                })?;
            request = request.with_duration_seconds(seconds)?;
        }
        Ok(request)
    }
}

/// Validated generation parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    prompt: String,
    aspect_ratio: String,
    duration_seconds: u32,
}

impl GenerationRequest {
    /// Build a request with default aspect ratio and duration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingPrompt`] when the prompt is blank.
    pub fn new(prompt: impl Into<String>) -> Result<Self, ValidationError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ValidationError::MissingPrompt);
        }
        Ok(Self {
            prompt,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            duration_seconds: DEFAULT_DURATION_SECONDS,
        })
    }

    /// Override the aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAspectRatio`] unless the value is two
    /// positive integers separated by `:`.
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Result<Self, ValidationError> {
        let aspect_ratio = aspect_ratio.into();
        if !is_ratio(&aspect_ratio) {
            return Err(ValidationError::InvalidAspectRatio {
                value: aspect_ratio,
            });
        }
        self.aspect_ratio = aspect_ratio;
        Ok(self)
    }

    /// Override the duration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDuration`] when `seconds` is zero.
    pub fn with_duration_seconds(mut self, seconds: u32) -> Result<Self, ValidationError> {
        if seconds == 0 {
            return Err(ValidationError::InvalidDuration {
                value: seconds.to_string(),
            });
        }
        self.duration_seconds = seconds;
        Ok(self)
    }

    /// Prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Aspect ratio in `W:H` form.
    #[must_use]
    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    /// Duration in seconds.
    #[must_use]
    pub const fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }
}

fn is_ratio(value: &str) -> bool {
    let Some((width, height)) = value.split_once(':') else {
        return false;
    };
    let positive = |part: &str| {
        !part.is_empty()
            && part.bytes().all(|byte| byte.is_ascii_digit())
            && part.bytes().any(|byte| byte != b'0')
    };
    positive(width) && positive(height)
}

/// Bearer token presented to the generation provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Opaque identifier of a submitted long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    /// Wrap a provider operation name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Operation name as issued by the provider.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OperationHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    /// The operation is still running.
    Pending,
    /// The operation completed with a payload.
    Done(OperationPayload),
    /// The operation completed with a provider-reported failure.
    Failed(OperationFailure),
}

/// Provider-reported failure attached to a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    /// Provider error code, if any.
    #[serde(default)]
    pub code: Option<i64>,
    /// Provider error message.
    #[serde(default)]
    pub message: String,
}

/// Terminal payload of a successful operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPayload {
    /// Provider response body; absent when the operation produced nothing.
    #[serde(default)]
    pub response: Option<GenerationResponse>,
}

/// Generation output as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Generated clips; only the first is used.
    #[serde(default)]
    pub videos: Vec<GeneratedVideo>,
    /// Number of clips removed by the content filter.
    #[serde(default)]
    pub rai_media_filtered_count: Option<u32>,
    /// Reasons given by the content filter.
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

/// A single generated clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    /// Inline clip bytes, base64 encoded.
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    /// Declared MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Cloud storage location, when the provider wrote the clip out of band.
    #[serde(default)]
    pub gcs_uri: Option<String>,
}

/// Media container of a generated asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    /// MPEG-4 (`video/mp4`).
    Mp4,
    /// `WebM` (`video/webm`).
    WebM,
    /// `QuickTime` (`video/quicktime`).
    QuickTime,
    /// Any other declared MIME type.
    Other(String),
}

impl MediaType {
    /// Map a declared MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "video/mp4" => Self::Mp4,
            "video/webm" => Self::WebM,
            "video/quicktime" => Self::QuickTime,
            _ => Self::Other(essence),
        }
    }

    /// Infer the container from leading bytes, defaulting to MP4.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
        if bytes.starts_with(&EBML_MAGIC) {
            return Self::WebM;
        }
        match bytes.get(4..8) {
            Some(b"ftyp") if bytes.get(8..12) == Some(&b"qt  "[..]) => Self::QuickTime,
            Some(b"moov" | b"mdat" | b"wide" | b"free") => Self::QuickTime,
            _ => Self::Mp4,
        }
    }

    /// File extension used when staging.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
            Self::QuickTime => "mov",
            Self::Other(_) => "bin",
        }
    }
}

/// Decoded binary output ready for staging.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    /// Raw asset bytes.
    pub bytes: Vec<u8>,
    /// Container type.
    pub media_type: MediaType,
}

impl fmt::Debug for GeneratedAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedAsset")
            .field("len", &self.bytes.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Destination options for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Storage resource class (for example `video`).
    pub resource_type: String,
    /// Destination folder.
    pub folder: String,
}

/// Durable location of a published asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedAsset {
    /// Publicly reachable HTTPS URL.
    pub secure_url: String,
    /// Storage-assigned identifier, when reported.
    pub public_id: Option<String>,
}
