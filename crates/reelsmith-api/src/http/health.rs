//! Status, health and metrics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use reelsmith_telemetry::build_sha;
use tracing::error;

use crate::http::constants::{PROMETHEUS_CONTENT_TYPE, STATUS_LINE};
use crate::http::dto::HealthResponse;
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn root() -> &'static str {
    STATUS_LINE
}

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let snapshot = state.telemetry.snapshot();
    Json(HealthResponse {
        status: "ok",
        build: build_sha(),
        in_flight: snapshot.in_flight,
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(axum::http::header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}
