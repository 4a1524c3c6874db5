//! Error responses rendered as `{ "error": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reelsmith_core::WorkflowError;

use crate::http::dto::ErrorBody;

/// Failure returned by a handler, carrying the status and client-facing message.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    message: String,
}

impl ApiError {
    const fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err.detail())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsmith_core::{PublishError, ValidationError};

    #[test]
    fn validation_errors_are_client_errors() {
        let err = ApiError::from(WorkflowError::from(ValidationError::MissingPrompt));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Missing 'prompt' in request body.");
    }

    #[test]
    fn downstream_errors_carry_their_cause() {
        let err = ApiError::from(WorkflowError::Publish {
            source: PublishError::Status {
                status: 401,
                message: Some("Invalid Signature".to_string()),
            },
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("Invalid Signature"), "{}", err.message());
    }

    #[test]
    fn timeouts_are_server_errors() {
        let err = ApiError::from(WorkflowError::TimedOut {
            operation: "operations/x".to_string(),
            attempts: 15,
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("after 15 attempts"));
    }
}
