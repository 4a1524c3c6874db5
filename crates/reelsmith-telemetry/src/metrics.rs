//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes a minimal set of counters/gauges relevant to generation workflows.

use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    workflows_total: IntCounterVec,
    poll_attempts_total: IntCounter,
    in_flight: IntGauge,
    release_failures_total: IntCounter,
    last_duration_ms: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Workflows currently executing.
    pub in_flight: i64,
    /// Total status checks issued against the generation provider.
    pub poll_attempts_total: u64,
    /// Staged files that could not be removed.
    pub release_failures_total: u64,
    /// Duration of the most recently finished workflow (ms).
    pub last_duration_ms: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| collector("http_requests_total", source))?;
        let workflows_total = IntCounterVec::new(
            Opts::new(
                "generation_workflows_total",
                "Generation workflows finished by outcome",
            ),
            &["outcome"],
        )
        .map_err(|source| collector("generation_workflows_total", source))?;
        let poll_attempts_total = IntCounter::with_opts(Opts::new(
            "generation_poll_attempts_total",
            "Operation status checks issued",
        ))
        .map_err(|source| collector("generation_poll_attempts_total", source))?;
        let in_flight = IntGauge::with_opts(Opts::new(
            "generation_in_flight",
            "Generation workflows currently executing",
        ))
        .map_err(|source| collector("generation_in_flight", source))?;
        let release_failures_total = IntCounter::with_opts(Opts::new(
            "staged_file_release_failures_total",
            "Staged files that could not be removed",
        ))
        .map_err(|source| collector("staged_file_release_failures_total", source))?;
        let last_duration_ms = IntGauge::with_opts(Opts::new(
            "generation_last_duration_ms",
            "Duration of the most recently finished workflow (ms)",
        ))
        .map_err(|source| collector("generation_last_duration_ms", source))?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "generation_workflows_total", &workflows_total)?;
        register(
            &registry,
            "generation_poll_attempts_total",
            &poll_attempts_total,
        )?;
        register(&registry, "generation_in_flight", &in_flight)?;
        register(
            &registry,
            "staged_file_release_failures_total",
            &release_failures_total,
        )?;
        register(&registry, "generation_last_duration_ms", &last_duration_ms)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                workflows_total,
                poll_attempts_total,
                in_flight,
                release_failures_total,
                last_duration_ms,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count a workflow that ended with `outcome` without recording its duration.
    pub fn inc_workflow(&self, outcome: &str) {
        self.inner
            .workflows_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a finished workflow with its outcome label and elapsed time.
    pub fn observe_workflow(&self, outcome: &str, elapsed: Duration) {
        self.inc_workflow(outcome);
        self.inner
            .last_duration_ms
            .set(Self::duration_to_ms(elapsed));
    }

    /// Increment the poll attempt counter.
    pub fn inc_poll_attempt(&self) {
        self.inner.poll_attempts_total.inc();
    }

    /// Mark a workflow as started.
    pub fn workflow_started(&self) {
        self.inner.in_flight.inc();
    }

    /// Mark a workflow as finished.
    pub fn workflow_finished(&self) {
        self.inner.in_flight.dec();
    }

    /// Increment the counter of staged files that could not be removed.
    pub fn inc_release_failure(&self) {
        self.inner.release_failures_total.inc();
    }

    /// Count of workflows finished with `outcome`.
    #[must_use]
    pub fn workflow_count(&self, outcome: &str) -> u64 {
        self.inner
            .workflows_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.inner.in_flight.get(),
            poll_attempts_total: self.inner.poll_attempts_total.get(),
            release_failures_total: self.inner.release_failures_total.get(),
            last_duration_ms: self.inner.last_duration_ms.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn collector(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsCollector { name, source }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
