//! End-to-end generation workflow.
//!
//! # Design
//! - Steps run strictly in order: validate, authenticate, submit, poll, extract, stage, publish, release.
//! - Validation happens before any collaborator is touched.
//! - The staged file is released after the upload attempt whatever its result; a failed release is
//!   logged and counted but never changes the workflow outcome.
//! - One access token is fetched per workflow and reused for submission and every status check.
//! - The workflow span carries the request id and route of the HTTP request that started it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use reelsmith_telemetry::{Metrics, RequestScope};
use tracing::field::Empty;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::extract::extract_asset;
use crate::model::{GenerationDraft, GenerationRequest, PublishedAsset, UploadOptions};
use crate::poller::{OperationPoller, PollOutcome, PollPolicy};
use crate::service::{CredentialProvider, GenerationProvider, Sleeper, StoragePublisher};
use crate::stage::{AssetStager, StagedFile};

/// External collaborators required by the workflow.
#[derive(Clone)]
pub struct WorkflowDependencies {
    /// Token source for the generation provider.
    pub credentials: Arc<dyn CredentialProvider>,
    /// Long-running generation service.
    pub generator: Arc<dyn GenerationProvider>,
    /// Durable storage for finished assets.
    pub publisher: Arc<dyn StoragePublisher>,
    /// Wait primitive used between status checks.
    pub sleeper: Arc<dyn Sleeper>,
}

/// Tunables for a workflow instance.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Status check schedule.
    pub poll: PollPolicy,
    /// Directory used for temporary asset files.
    pub staging_dir: PathBuf,
    /// Destination for published assets.
    pub upload: UploadOptions,
}

/// Orchestrates one prompt-to-URL generation per call.
pub struct GenerationWorkflow {
    deps: WorkflowDependencies,
    poll: PollPolicy,
    stager: AssetStager,
    upload: UploadOptions,
    metrics: Metrics,
}

impl GenerationWorkflow {
    /// Assemble a workflow from collaborators and settings.
    #[must_use]
    pub fn new(deps: WorkflowDependencies, settings: WorkflowSettings, metrics: Metrics) -> Self {
        Self {
            deps,
            poll: settings.poll,
            stager: AssetStager::new(settings.staging_dir),
            upload: settings.upload,
            metrics,
        }
    }

    /// Shared metrics handle.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run the full workflow for `draft` and return the published asset.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] naming the step that failed. Validation
    /// failures are reported before any external call is made.
    pub async fn generate(&self, draft: GenerationDraft) -> WorkflowResult<PublishedAsset> {
        let request = match draft.validate() {
            Ok(request) => request,
            Err(err) => {
                let field = err.field();
                let err = WorkflowError::from(err);
                self.metrics.inc_workflow(err.kind());
                info!(field, error = %err, "rejected generation request");
                return Err(err);
            }
        };

        let id = Uuid::new_v4();
        let span = info_span!(
            "generation_workflow",
            workflow_id = %id,
            request_id = Empty,
            route = Empty
        );
        if let Some(scope) = RequestScope::current() {
            span.record("request_id", scope.request_id());
            span.record("route", scope.route());
        }
        let started = Instant::now();
        self.metrics.workflow_started();
        let result = self.execute(id, &request).instrument(span.clone()).await;
        self.metrics.workflow_finished();

        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        span.in_scope(|| match &result {
            Ok(asset) => {
                self.metrics.observe_workflow("success", elapsed);
                info!(url = %asset.secure_url, elapsed_ms, "video published");
            }
            Err(err) => {
                self.metrics.observe_workflow(err.kind(), elapsed);
                warn!(outcome = err.kind(), error = %err.detail(), elapsed_ms, "generation workflow failed");
            }
        });
        result
    }

    async fn execute(&self, id: Uuid, request: &GenerationRequest) -> WorkflowResult<PublishedAsset> {
        info!(
            aspect_ratio = request.aspect_ratio(),
            duration_seconds = request.duration_seconds(),
            "starting video generation"
        );

        let token = self
            .deps
            .credentials
            .access_token()
            .await
            .map_err(|source| WorkflowError::Credential { source })?;

        let handle = self
            .deps
            .generator
            .submit(request, &token)
            .await
            .map_err(|source| WorkflowError::Submission { source })?;
        info!(operation = %handle, "generation job submitted");

        let poller = OperationPoller::new(
            self.deps.generator.as_ref(),
            self.deps.sleeper.as_ref(),
            self.poll,
            &self.metrics,
        );
        let payload = match poller.run(&handle, &token).await? {
            PollOutcome::Done { payload, .. } => payload,
            PollOutcome::TimedOut { attempts } => {
                return Err(WorkflowError::TimedOut {
                    operation: handle.to_string(),
                    attempts,
                });
            }
        };

        let asset = extract_asset(&payload).map_err(|source| WorkflowError::MissingAsset { source })?;
        drop(payload);

        let staged = self
            .stager
            .stage(&asset, id)
            .await
            .map_err(|source| WorkflowError::Staging { source })?;
        drop(asset);

        let published = self.deps.publisher.upload(staged.path(), &self.upload).await;
        self.release(staged).await;
        published.map_err(|source| WorkflowError::Publish { source })
    }

    async fn release(&self, staged: StagedFile) {
        if let Err(err) = self.stager.release(staged).await {
            self.metrics.inc_release_failure();
            error!(path = %err.path.display(), error = %err, "failed to release staged file");
        }
    }
}
