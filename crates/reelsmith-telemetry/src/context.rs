//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - The request id and matched route live in task-local storage; the generation workflow copies
//!   them onto its span.
//! - `GlobalContextGuard` keeps a process-wide span carrying service name and build sha.

use std::future::Future;
use std::sync::Arc;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", service = %service, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Identifiers of the HTTP request a task is working on behalf of.
///
/// Task-local, so a scope must be re-entered on every spawned task that
/// should keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    request_id: Arc<str>,
    route: Arc<str>,
}

impl RequestScope {
    /// Scope for the request `request_id` matched against `route`.
    #[must_use]
    pub fn new(request_id: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            request_id: Arc::from(request_id.into()),
            route: Arc::from(route.into()),
        }
    }

    /// Scope of the request the current task serves, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE_SCOPE.try_with(Clone::clone).ok()
    }

    /// Value of the request id header, empty when the client sent none.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Matched route template.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Drive `fut` with this scope visible to [`RequestScope::current`].
    pub async fn run<Fut: Future>(self, fut: Fut) -> Fut::Output {
        ACTIVE_SCOPE.scope(self, fut).await
    }
}

tokio::task_local! {
    static ACTIVE_SCOPE: RequestScope;
}
