//! Vertex AI long-running prediction client.
//!
//! # Design
//! - Submission uses `:predictLongRunning`; status checks use `:fetchPredictOperation`.
//! - Every non-2xx status, unparsable body or transport error is surfaced, never retried here.
//! - A provider `error` object outranks `done`; a finished operation without one is parsed into the core payload.

use async_trait::async_trait;
use reelsmith_config::VertexConfig;
use reelsmith_core::{
    AccessToken, GenerationProvider, GenerationRequest, GenerationResponse, OperationFailure,
    OperationHandle, OperationPayload, PollError, PollResult, SubmissionError,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{error_message, snippet};

const PERSON_GENERATION: &str = "allow_adult";
const SAMPLE_COUNT: u32 = 1;

/// [`GenerationProvider`] backed by the Vertex AI REST API.
#[derive(Debug, Clone)]
pub struct VertexClient {
    client: Client,
    base_url: String,
    model_resource: String,
}

impl VertexClient {
    /// Build a client for the model described by `config`.
    #[must_use]
    pub fn new(client: Client, config: &VertexConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_resource: config.model_resource(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/v1/{}:{method}", self.base_url, self.model_resource)
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    endpoint: &'a str,
    instances: [PromptInstance<'a>; 1],
    parameters: GenerationParameters<'a>,
}

#[derive(Serialize)]
struct PromptInstance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParameters<'a> {
    aspect_ratio: &'a str,
    sample_count: u32,
    duration_seconds: String,
    person_generation: &'static str,
    enable_prompt_rewriting: bool,
    add_watermark: bool,
    include_rai_reason: bool,
}

impl<'a> PredictRequest<'a> {
    fn new(endpoint: &'a str, request: &'a GenerationRequest) -> Self {
        Self {
            endpoint,
            instances: [PromptInstance {
                prompt: request.prompt(),
            }],
            parameters: GenerationParameters {
                aspect_ratio: request.aspect_ratio(),
                sample_count: SAMPLE_COUNT,
                duration_seconds: request.duration_seconds().to_string(),
                person_generation: PERSON_GENERATION,
                enable_prompt_rewriting: true,
                add_watermark: true,
                include_rai_reason: true,
            },
        }
    }
}

#[derive(Deserialize)]
struct OperationName {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchOperationRequest<'a> {
    operation_name: &'a str,
}

#[derive(Deserialize)]
struct FetchOperationBody {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationFailure>,
    #[serde(default)]
    response: Option<serde_json::Value>,
}

impl FetchOperationBody {
    fn into_poll_result(self) -> Result<PollResult, PollError> {
        if let Some(failure) = self.error {
            return Ok(PollResult::Failed(failure));
        }
        if !self.done {
            return Ok(PollResult::Pending);
        }
        let response = self
            .response
            .map(serde_json::from_value::<GenerationResponse>)
            .transpose()
            .map_err(|err| PollError::Malformed {
                detail: format!("unexpected response shape: {err}"),
            })?;
        Ok(PollResult::Done(OperationPayload { response }))
    }
}

#[async_trait]
impl GenerationProvider for VertexClient {
    async fn submit(
        &self,
        request: &GenerationRequest,
        token: &AccessToken,
    ) -> Result<OperationHandle, SubmissionError> {
        let url = self.method_url("predictLongRunning");
        let body = PredictRequest::new(&self.model_resource, request);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport {
                source: Box::new(err),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| SubmissionError::Transport {
                source: Box::new(err),
            })?;
        if !status.is_success() {
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: OperationName =
            serde_json::from_str(&text).map_err(|err| SubmissionError::Malformed {
                detail: format!("{err}; body: {}", snippet(&text)),
            })?;
        let name = parsed
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(SubmissionError::MissingOperationName)?;
        debug!(operation = %name, "vertex accepted generation request");
        Ok(OperationHandle::new(name))
    }

    async fn poll(
        &self,
        handle: &OperationHandle,
        token: &AccessToken,
    ) -> Result<PollResult, PollError> {
        let url = self.method_url("fetchPredictOperation");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .json(&FetchOperationRequest {
                operation_name: handle.as_str(),
            })
            .send()
            .await
            .map_err(|err| PollError::Transport {
                source: Box::new(err),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| PollError::Transport {
            source: Box::new(err),
        })?;
        if !status.is_success() {
            return Err(PollError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: FetchOperationBody =
            serde_json::from_str(&text).map_err(|err| PollError::Malformed {
                detail: format!("{err}; body: {}", snippet(&text)),
            })?;
        body.into_poll_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn predict_request_serializes_duration_as_string() -> anyhow::Result<()> {
        let request = GenerationRequest::new("a cat surfing")?.with_duration_seconds(6)?;
        let body = serde_json::to_value(PredictRequest::new("projects/p/models/m", &request))?;
        assert_eq!(
            body,
            json!({
                "endpoint": "projects/p/models/m",
                "instances": [{ "prompt": "a cat surfing" }],
                "parameters": {
                    "aspectRatio": "16:9",
                    "sampleCount": 1,
                    "durationSeconds": "6",
                    "personGeneration": "allow_adult",
                    "enablePromptRewriting": true,
                    "addWatermark": true,
                    "includeRaiReason": true
                }
            })
        );
        Ok(())
    }

    #[test]
    fn operation_body_states() -> Result<(), PollError> {
        let pending: FetchOperationBody =
            serde_json::from_value(json!({ "name": "op" })).map_err(malformed)?;
        assert_eq!(pending.into_poll_result()?, PollResult::Pending);

        let failed: FetchOperationBody = serde_json::from_value(json!({
            "done": true,
            "error": { "code": 3, "message": "unsafe prompt" }
        }))
        .map_err(malformed)?;
        assert!(matches!(
            failed.into_poll_result()?,
            PollResult::Failed(OperationFailure { code: Some(3), .. })
        ));

        let done: FetchOperationBody = serde_json::from_value(json!({
            "done": true,
            "response": { "videos": [{ "bytesBase64Encoded": "AAAA" }] }
        }))
        .map_err(malformed)?;
        let PollResult::Done(payload) = done.into_poll_result()? else {
            panic!("expected done");
        };
        assert_eq!(payload.response.map(|r| r.videos.len()), Some(1));
        Ok(())
    }

    #[test]
    fn done_with_unexpected_response_shape_is_malformed() {
        let body: FetchOperationBody = serde_json::from_value(json!({
            "done": true,
            "response": { "videos": "not-a-list" }
        }))
        .unwrap_or_else(|err| panic!("body should parse: {err}"));
        assert!(matches!(
            body.into_poll_result(),
            Err(PollError::Malformed { .. })
        ));
    }

    fn malformed(err: serde_json::Error) -> PollError {
        PollError::Malformed {
            detail: err.to_string(),
        }
    }
}
