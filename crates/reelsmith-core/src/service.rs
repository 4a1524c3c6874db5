//! Collaborator interfaces the workflow depends on.
//!
//! # Design
//! - Each external system sits behind an object-safe async trait so tests can substitute fakes.
//! - Waiting is a collaborator too, which keeps poll intervals observable without real time passing.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CredentialError, PollError, PublishError, SubmissionError};
use crate::model::{
    AccessToken, GenerationRequest, OperationHandle, PollResult, PublishedAsset, UploadOptions,
};

/// Source of bearer tokens for the generation provider.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a token valid for the duration of one workflow.
    async fn access_token(&self) -> Result<AccessToken, CredentialError>;
}

/// Long-running generation service.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit a generation job and return its operation handle.
    async fn submit(
        &self,
        request: &GenerationRequest,
        token: &AccessToken,
    ) -> Result<OperationHandle, SubmissionError>;

    /// Check the status of a previously submitted operation.
    async fn poll(
        &self,
        handle: &OperationHandle,
        token: &AccessToken,
    ) -> Result<PollResult, PollError>;
}

/// Durable object storage for generated assets.
#[async_trait]
pub trait StoragePublisher: Send + Sync {
    /// Upload the file at `path` and return its public location.
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<PublishedAsset, PublishError>;
}

/// Suspends the current task between status checks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokio_sleeper_waits_at_least_the_requested_duration() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(5)).await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
