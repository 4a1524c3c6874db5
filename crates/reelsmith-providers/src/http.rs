//! Shared HTTP client construction and response helpers.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

const BODY_SNIPPET_LIMIT: usize = 256;

/// Build the HTTP client shared by every adapter.
///
/// # Errors
///
/// Returns [`ProviderError::HttpClient`] when the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reelsmith/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ProviderError::HttpClient { source })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Provider error message carried in a `{"error": ...}` envelope, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorEnvelope>(body).ok()?.error {
        ErrorBody::Detailed { message } | ErrorBody::Plain(message) => Some(message),
    }
}

/// Leading slice of a response body suitable for diagnostics.
pub(crate) fn snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
