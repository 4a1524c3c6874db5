//! Error taxonomy for the generation workflow and its collaborators.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used by collaborator implementations to carry transport details.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Convenience alias for workflow results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Request fields that failed validation before any network activity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Prompt was absent, not a string, or blank.
    #[error("Missing 'prompt' in request body.")]
    MissingPrompt,
    /// Aspect ratio did not have the `W:H` shape.
    #[error("'aspectRatio' must look like \"16:9\", got \"{value}\"")]
    InvalidAspectRatio {
        /// Rejected value.
        value: String,
    },
    /// Duration was not a positive whole number of seconds.
    #[error("'durationSeconds' must be a positive integer, got \"{value}\"")]
    InvalidDuration {
        /// Rejected value.
        value: String,
    },
}

impl ValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingPrompt => "prompt",
            Self::InvalidAspectRatio { .. } => "aspectRatio",
            Self::InvalidDuration { .. } => "durationSeconds",
        }
    }
}

/// Failure to obtain an access token.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The credential helper could not be launched or reached.
    #[error("credential source {provider} is unavailable")]
    Unavailable {
        /// Credential source name.
        provider: &'static str,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The credential helper ran but reported failure.
    #[error("credential source {provider} failed: {detail}")]
    Rejected {
        /// Credential source name.
        provider: &'static str,
        /// Diagnostic output from the helper.
        detail: String,
    },
    /// The credential helper succeeded without producing a token.
    #[error("credential source {provider} returned an empty token")]
    Empty {
        /// Credential source name.
        provider: &'static str,
    },
}

/// Failure to submit a generation job.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The request never produced an HTTP response.
    #[error("generation request could not be sent")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The provider answered with a non-success status.
    #[error("generation provider rejected the request with status {status}{}", render_message(.message.as_deref()))]
    Status {
        /// HTTP status code returned.
        status: u16,
        /// Provider-supplied error message, if any.
        message: Option<String>,
    },
    /// The response body could not be interpreted.
    #[error("generation provider response was malformed: {detail}")]
    Malformed {
        /// Parse diagnostic.
        detail: String,
    },
    /// The response parsed but carried no operation name.
    #[error("no operation name received from generation provider")]
    MissingOperationName,
}

/// Failure while checking operation status. Every variant is fatal to the poll loop.
#[derive(Debug, Error)]
pub enum PollError {
    /// The status request never produced an HTTP response.
    #[error("operation status request could not be sent")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The provider answered with a non-success status.
    #[error("operation status request failed with status {status}{}", render_message(.message.as_deref()))]
    Status {
        /// HTTP status code returned.
        status: u16,
        /// Provider-supplied error message, if any.
        message: Option<String>,
    },
    /// The status body could not be interpreted.
    #[error("operation status response was malformed: {detail}")]
    Malformed {
        /// Parse diagnostic.
        detail: String,
    },
    /// The provider reported the operation itself as failed.
    #[error("generation operation failed: {message}")]
    Operation {
        /// Provider error code, if supplied.
        code: Option<i64>,
        /// Provider error message.
        message: String,
    },
}

/// Failure to obtain a usable binary asset from a terminal payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No binary field was present at the expected location.
    #[error(
        "no video found in response{}{}",
        render_filtered(.filtered_reasons),
        render_location(.gcs_uri.as_deref())
    )]
    Absent {
        /// Storage location of the clip when it was delivered by reference only.
        gcs_uri: Option<String>,
        /// Number of items removed by the provider's content filter, if reported.
        filtered_count: Option<u32>,
        /// Reasons the provider gave for filtering, if any.
        filtered_reasons: Vec<String>,
    },
    /// The binary field was present but empty.
    #[error("video payload in response was empty")]
    Empty,
    /// The binary field was not valid base64.
    #[error("video payload in response was not valid base64")]
    Decode {
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },
}

/// Filesystem failure while staging or releasing a temporary asset file.
#[derive(Debug, Error)]
#[error("failed to {operation} staged file {}", .path.display())]
pub struct StagingError {
    /// Operation that failed (`create`, `write`, `remove`).
    pub operation: &'static str,
    /// File or directory involved.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Failure to upload a staged asset to durable storage.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The staged file could not be read.
    #[error("staged file {} could not be read", .path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The upload never produced an HTTP response.
    #[error("upload request could not be sent")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The storage service answered with a non-success status.
    #[error("storage service rejected the upload with status {status}{}", render_message(.message.as_deref()))]
    Status {
        /// HTTP status code returned.
        status: u16,
        /// Service-supplied error message, if any.
        message: Option<String>,
    },
    /// The upload response could not be interpreted.
    #[error("storage service response was malformed: {detail}")]
    Malformed {
        /// Parse diagnostic.
        detail: String,
    },
}

/// Terminal failure of a generation workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Access token could not be acquired.
    #[error("failed to acquire access token")]
    Credential {
        /// Underlying credential failure.
        #[source]
        source: CredentialError,
    },
    /// Job submission failed.
    #[error("failed to submit generation job")]
    Submission {
        /// Underlying submission failure.
        #[source]
        source: SubmissionError,
    },
    /// A status check failed.
    #[error("failed to poll operation {operation} on attempt {attempt}")]
    Poll {
        /// Operation being polled.
        operation: String,
        /// 1-based attempt that failed.
        attempt: u32,
        /// Underlying poll failure.
        #[source]
        source: PollError,
    },
    /// The operation did not complete within the attempt budget.
    #[error("timed out waiting for video generation after {attempts} attempts")]
    TimedOut {
        /// Operation that was abandoned.
        operation: String,
        /// Attempts issued before giving up.
        attempts: u32,
    },
    /// The completed operation carried no usable asset.
    #[error("generation finished without a usable video")]
    MissingAsset {
        /// Underlying extraction failure.
        #[source]
        source: ExtractError,
    },
    /// The asset could not be written to temporary storage.
    #[error("failed to stage generated video")]
    Staging {
        /// Underlying staging failure.
        #[source]
        source: StagingError,
    },
    /// The asset could not be uploaded.
    #[error("failed to publish generated video")]
    Publish {
        /// Underlying publish failure.
        #[source]
        source: PublishError,
    },
}

impl WorkflowError {
    /// Stable outcome label used in metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Credential { .. } => "credential_error",
            Self::Submission { .. } => "submission_error",
            Self::Poll { .. } => "poll_error",
            Self::TimedOut { .. } => "timed_out",
            Self::MissingAsset { .. } => "missing_asset",
            Self::Staging { .. } => "staging_error",
            Self::Publish { .. } => "publish_error",
        }
    }

    /// Whether the failure was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Human-readable message including the chain of underlying causes.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut current = StdError::source(self);
        while let Some(cause) = current {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            current = cause.source();
        }
        message
    }
}

fn render_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |text| format!(": {text}"))
}

fn render_filtered(reasons: &[String]) -> String {
    if reasons.is_empty() {
        String::new()
    } else {
        format!(" (filtered: {})", reasons.join("; "))
    }
}

fn render_location(gcs_uri: Option<&str>) -> String {
    gcs_uri.map_or_else(String::new, |uri| format!(" (stored at {uri}, inline bytes missing)"))
}
