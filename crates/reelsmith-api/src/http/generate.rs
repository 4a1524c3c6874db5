//! `POST /generate`.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use reelsmith_core::GenerationDraft;
use reelsmith_telemetry::RequestScope;
use tracing::{Instrument, error, info, warn};

use crate::http::dto::{GenerateRequestBody, GenerateResponse};
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Run one generation workflow and answer with the published URL.
///
/// The workflow runs on its own task so a dropped connection cannot abort it
/// halfway and leave a staged file behind.
pub(crate) async fn generate(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<GenerateRequestBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected unparsable generation request");
        ApiError::bad_request(rejection.body_text())
    })?;
    let draft = GenerationDraft::from(body);

    let workflow = Arc::clone(&state.workflow);
    let run = async move { workflow.generate(draft).await };
    let task = match RequestScope::current() {
        Some(scope) => tokio::spawn(scope.run(run).in_current_span()),
        None => tokio::spawn(run.in_current_span()),
    };

    let asset = task
        .await
        .map_err(|err| {
            error!(error = %err, "generation task did not complete");
            ApiError::internal("generation task did not complete")
        })?
        .map_err(ApiError::from)?;
    info!(url = %asset.secure_url, "generation request served");
    Ok(Json(GenerateResponse {
        video_url: asset.secure_url,
    }))
}
