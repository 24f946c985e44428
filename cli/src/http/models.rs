//! HTTP API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use stepflow_core::error::{ErrorCode, ExecutorError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub runs_total: u64,
}

/// Unified error type for handlers
///
/// Execution never fails once a plan is accepted, so every handler error is a
/// rejected plan.
#[derive(Debug)]
pub struct HttpServerError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<ExecutorError> for HttpServerError {
    fn from(err: ExecutorError) -> Self {
        Self {
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.message,
            "error_code": self.code.as_str(),
        });

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error_maps_to_bad_request() {
        let err: HttpServerError = ExecutorError::DuplicateStepId(4).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains('4'));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_failure_keeps_its_code() {
        let err: HttpServerError = ExecutorError::InvalidPlan("missing topic".into()).into();
        assert_eq!(err.code.as_str(), "PARSE_ERROR");
    }
}
