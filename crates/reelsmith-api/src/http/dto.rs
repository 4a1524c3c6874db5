//! Request and response bodies for the generation endpoint.

use reelsmith_core::GenerationDraft;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body accepted by `POST /generate`.
///
/// Fields are captured loosely so that type mismatches surface as field
/// validation errors instead of opaque deserialisation failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequestBody {
    #[serde(default)]
    pub(crate) prompt: Option<Value>,
    #[serde(default)]
    pub(crate) aspect_ratio: Option<Value>,
    #[serde(default)]
    pub(crate) duration_seconds: Option<Value>,
}

impl From<GenerateRequestBody> for GenerationDraft {
    fn from(body: GenerateRequestBody) -> Self {
        Self {
            // A non-string prompt is treated as absent.
            prompt: body.prompt.and_then(|value| match value {
                Value::String(text) => Some(text),
                _ => None,
            }),
            aspect_ratio: body.aspect_ratio.and_then(textual),
            duration_seconds: body.duration_seconds.and_then(textual),
        }
    }
}

fn textual(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Successful generation response.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateResponse {
    #[serde(rename = "videoUrl")]
    pub(crate) video_url: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

/// Health endpoint body.
#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: &'static str,
    pub(crate) in_flight: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(value: Value) -> anyhow::Result<GenerationDraft> {
        let body: GenerateRequestBody = serde_json::from_value(value)?;
        Ok(GenerationDraft::from(body))
    }

    #[test]
    fn numeric_and_string_durations_share_a_path() -> anyhow::Result<()> {
        let numeric = draft(json!({ "prompt": "p", "durationSeconds": 6 }))?;
        let text = draft(json!({ "prompt": "p", "durationSeconds": "6" }))?;
        assert_eq!(numeric.duration_seconds.as_deref(), Some("6"));
        assert_eq!(numeric, text);
        Ok(())
    }

    #[test]
    fn non_string_prompt_is_absent() -> anyhow::Result<()> {
        let parsed = draft(json!({ "prompt": 42 }))?;
        assert_eq!(parsed.prompt, None);
        Ok(())
    }

    #[test]
    fn nulls_fall_back_to_defaults() -> anyhow::Result<()> {
        let parsed = draft(json!({ "prompt": "p", "aspectRatio": null, "durationSeconds": null }))?;
        assert_eq!(parsed, GenerationDraft::with_prompt("p"));
        Ok(())
    }

    #[test]
    fn response_uses_camel_case_key() -> anyhow::Result<()> {
        let body = serde_json::to_value(GenerateResponse {
            video_url: "https://cdn.example/v.mp4".to_string(),
        })?;
        assert_eq!(body, json!({ "videoUrl": "https://cdn.example/v.mp4" }));
        Ok(())
    }
}
