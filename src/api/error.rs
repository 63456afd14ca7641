//! Mapping of service errors onto HTTP responses.

use crate::error::{FieldIssue, InferenceError, ValidationError};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Generic message returned for server-side failures. The cause is only logged.
pub const INFERENCE_FAILURE_MESSAGE: &str = "model inference failed";

/// Error returned from a request handler
#[derive(Debug)]
pub enum ApiError {
    /// Body was not a usable JSON document (syntax, content type, ...)
    Malformed { status: StatusCode, message: String },
    /// Body was JSON but not a valid patient record
    Validation(ValidationError),
    /// The model failed while scoring a valid record
    Inference(InferenceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Malformed { status, .. } => *status,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::Inference(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Malformed { message, .. } => json!({
                "error": "validation_error",
                "detail": [FieldIssue::new("body", message)],
            }),
            ApiError::Validation(err) => json!({
                "error": "validation_error",
                "detail": err.issues(),
            }),
            ApiError::Inference(_) => json!({
                "error": "inference_error",
                "detail": INFERENCE_FAILURE_MESSAGE,
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation = ApiError::from(ValidationError::body("expected a JSON object"));
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let inference = ApiError::from(InferenceError::MissingOutput);
        assert_eq!(inference.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_inference_detail_is_generic() {
        let response =
            ApiError::from(InferenceError::Runtime("tensor shape mismatch".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
