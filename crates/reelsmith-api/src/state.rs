//! State shared by every request handler.

use std::sync::Arc;

use reelsmith_core::GenerationWorkflow;
use reelsmith_telemetry::Metrics;

/// Read-only handles shared across requests.
pub(crate) struct ApiState {
    pub(crate) workflow: Arc<GenerationWorkflow>,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) const fn new(workflow: Arc<GenerationWorkflow>, telemetry: Metrics) -> Self {
        Self {
            workflow,
            telemetry,
        }
    }
}
