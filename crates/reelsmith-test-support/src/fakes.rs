//! Scripted and recording collaborators for workflow tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reelsmith_core::{
    AccessToken, CredentialError, CredentialProvider, GenerationProvider, GenerationRequest,
    OperationHandle, PollError, PollResult, PublishError, PublishedAsset, Sleeper,
    StoragePublisher, SubmissionError, UploadOptions,
};

use crate::fixtures::{OPERATION_NAME, TEST_TOKEN};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Credentials that always hand out the same token and count requests.
#[derive(Debug)]
pub struct StaticCredentials {
    token: String,
    calls: AtomicUsize,
}

impl StaticCredentials {
    /// Credentials issuing [`TEST_TOKEN`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_token(TEST_TOKEN)
    }

    /// Credentials issuing `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of tokens handed out.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(self.token.clone()))
    }
}

/// Credentials that always fail.
#[derive(Debug, Default)]
pub struct FailingCredentials;

#[async_trait]
impl CredentialProvider for FailingCredentials {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::Rejected {
            provider: "fake",
            detail: "no credentials configured".to_string(),
        })
    }
}

/// Generator that replays a scripted sequence of status answers.
///
/// Once the script is exhausted every further check reports `Pending`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    submit_error: Mutex<Option<SubmissionError>>,
    script: Mutex<VecDeque<Result<PollResult, PollError>>>,
    submissions: Mutex<Vec<(GenerationRequest, String)>>,
    polls: Mutex<Vec<(OperationHandle, String)>>,
}

impl ScriptedGenerator {
    /// Generator whose status checks replay `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Result<PollResult, PollError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Generator that reports `Pending` for every check.
    #[must_use]
    pub fn always_pending() -> Self {
        Self::default()
    }

    /// Generator that answers `Pending` `pending` times before finishing with `result`.
    #[must_use]
    pub fn pending_then(pending: usize, result: PollResult) -> Self {
        let mut script: Vec<Result<PollResult, PollError>> =
            (0..pending).map(|_| Ok(PollResult::Pending)).collect();
        script.push(Ok(result));
        Self::new(script)
    }

    /// Make the next submission fail with `error`.
    #[must_use]
    pub fn failing_submit(self, error: SubmissionError) -> Self {
        *lock(&self.submit_error) = Some(error);
        self
    }

    /// Requests submitted so far, with the token each carried.
    #[must_use]
    pub fn submissions(&self) -> Vec<(GenerationRequest, String)> {
        lock(&self.submissions).clone()
    }

    /// Status checks issued so far, with the token each carried.
    #[must_use]
    pub fn polls(&self) -> Vec<(OperationHandle, String)> {
        lock(&self.polls).clone()
    }

    /// Number of status checks issued so far.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        lock(&self.polls).len()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    async fn submit(
        &self,
        request: &GenerationRequest,
        token: &AccessToken,
    ) -> Result<OperationHandle, SubmissionError> {
        lock(&self.submissions).push((request.clone(), token.expose().to_string()));
        if let Some(error) = lock(&self.submit_error).take() {
            return Err(error);
        }
        Ok(OperationHandle::new(OPERATION_NAME))
    }

    async fn poll(
        &self,
        handle: &OperationHandle,
        token: &AccessToken,
    ) -> Result<PollResult, PollError> {
        lock(&self.polls).push((handle.clone(), token.expose().to_string()));
        lock(&self.script)
            .pop_front()
            .unwrap_or(Ok(PollResult::Pending))
    }
}

/// Sleeper that records requested waits and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Waits requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        lock(&self.waits).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.waits).push(duration);
    }
}

/// A file observed by [`RecordingPublisher`] at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    /// Path handed to the publisher.
    pub path: PathBuf,
    /// File contents at upload time.
    pub bytes: Vec<u8>,
    /// Destination options.
    pub options: UploadOptions,
}

/// Publisher that reads the staged file and returns a deterministic URL.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    fail_with_status: Option<u16>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingPublisher {
    /// Publisher whose uploads always fail with `status`.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    /// Uploads observed so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        lock(&self.uploads).clone()
    }

    /// URL returned for a staged file at `path`.
    #[must_use]
    pub fn url_for(path: &Path, options: &UploadOptions) -> String {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("asset");
        format!(
            "https://res.cloudinary.com/demo/{}/upload/v1700000000/{}/{stem}.mp4",
            options.resource_type, options.folder
        )
    }
}

#[async_trait]
impl StoragePublisher for RecordingPublisher {
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<PublishedAsset, PublishError> {
        let bytes = std::fs::read(path).map_err(|source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        lock(&self.uploads).push(RecordedUpload {
            path: path.to_path_buf(),
            bytes,
            options: options.clone(),
        });
        if let Some(status) = self.fail_with_status {
            return Err(PublishError::Status {
                status,
                message: Some("upload rejected".to_string()),
            });
        }
        Ok(PublishedAsset {
            secure_url: Self::url_for(path, options),
            public_id: path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| format!("{}/{stem}", options.folder)),
        })
    }
}
