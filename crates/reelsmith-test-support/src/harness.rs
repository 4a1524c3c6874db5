//! Workflow wired to fakes and a private staging directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelsmith_core::{
    CredentialProvider, GenerationWorkflow, PollPolicy, WorkflowDependencies, WorkflowSettings,
};
use reelsmith_telemetry::Metrics;
use tempfile::TempDir;

use crate::fakes::{RecordingPublisher, RecordingSleeper, ScriptedGenerator, StaticCredentials};
use crate::fixtures::upload_options;

/// Policy used by harnessed workflows: the production schedule, with waits recorded rather than slept.
pub const HARNESS_POLICY: PollPolicy = PollPolicy::new(Duration::from_millis(2_000), 15);

/// A workflow plus handles on every fake it uses.
pub struct WorkflowHarness {
    /// Workflow under test.
    pub workflow: Arc<GenerationWorkflow>,
    /// Scripted generation provider.
    pub generator: Arc<ScriptedGenerator>,
    /// Recording storage publisher.
    pub publisher: Arc<RecordingPublisher>,
    /// Recording sleeper.
    pub sleeper: Arc<RecordingSleeper>,
    /// Metrics registry shared with the workflow.
    pub metrics: Metrics,
    staging: TempDir,
}

impl WorkflowHarness {
    /// Start building a harness around `generator`.
    #[must_use]
    pub fn builder(generator: ScriptedGenerator) -> HarnessBuilder {
        HarnessBuilder {
            generator,
            publisher: RecordingPublisher::default(),
            credentials: Arc::new(StaticCredentials::new()),
            policy: HARNESS_POLICY,
        }
    }

    /// Harness with default fakes around `generator`.
    ///
    /// # Errors
    ///
    /// Returns an error when the staging directory or metrics registry cannot be created.
    pub fn new(generator: ScriptedGenerator) -> anyhow::Result<Self> {
        Self::builder(generator).build()
    }

    /// Staging directory used by the workflow.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging.path().join("staging")
    }

    /// Files currently present in the staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory exists but cannot be listed.
    pub fn staged_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let dir = self.staging_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            files.push(entry?.path());
        }
        Ok(files)
    }
}

/// Builder for [`WorkflowHarness`].
pub struct HarnessBuilder {
    generator: ScriptedGenerator,
    publisher: RecordingPublisher,
    credentials: Arc<dyn CredentialProvider>,
    policy: PollPolicy,
}

impl HarnessBuilder {
    /// Use `publisher` instead of a succeeding one.
    #[must_use]
    pub fn publisher(mut self, publisher: RecordingPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    /// Use `credentials` instead of static ones.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Use `policy` instead of [`HARNESS_POLICY`].
    #[must_use]
    pub fn policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wire the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error when the staging directory or metrics registry cannot be created.
    pub fn build(self) -> anyhow::Result<WorkflowHarness> {
        let staging = TempDir::new()?;
        let metrics = Metrics::new()?;
        let generator = Arc::new(self.generator);
        let publisher = Arc::new(self.publisher);
        let sleeper = Arc::new(RecordingSleeper::default());

        let deps = WorkflowDependencies {
            credentials: self.credentials,
            generator: generator.clone(),
            publisher: publisher.clone(),
            sleeper: sleeper.clone(),
        };
        let settings = WorkflowSettings {
            poll: self.policy,
            staging_dir: staging.path().join("staging"),
            upload: upload_options(),
        };
        let workflow = Arc::new(GenerationWorkflow::new(deps, settings, metrics.clone()));

        Ok(WorkflowHarness {
            workflow,
            generator,
            publisher,
            sleeper,
            metrics,
            staging,
        })
    }
}
