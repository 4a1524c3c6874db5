//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use reelsmith_core::GenerationWorkflow;
use reelsmith_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::generate::generate;
use crate::http::health::{health, metrics, root};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

/// Axum router wrapper hosting the generation endpoints.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the routes and middleware stack around `workflow`.
    #[must_use]
    pub fn new(workflow: Arc<GenerationWorkflow>, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(workflow, telemetry.clone()));

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_REQUEST_ID)]);

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(reelsmith_telemetry::propagate_request_id_layer())
            .layer(reelsmith_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Router::new()
            .route("/", get(root))
            .route("/generate", post(generate))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Consume the server and hand back the configured router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind `addr` and serve until the process stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server terminates abnormally.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        tracing::info!(%addr, "serving generation API");
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
