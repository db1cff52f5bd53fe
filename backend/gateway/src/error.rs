//! HTTP mapping for pipeline errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use signvision_core::SignVisionError;
use signvision_logging::redact_sensitive_data;
use tracing::{error, warn};

/// Error body: `{"error": ..., "detail": ...}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// An error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request".to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "Vision model not configured".to_string(),
            detail: Some("Set GEMINI_API_KEY (or model.apiKey) and restart the server".to_string()),
        }
    }
}

impl From<SignVisionError> for ApiError {
    fn from(err: SignVisionError) -> Self {
        match err {
            SignVisionError::InvalidInput(detail) => Self::bad_request(detail),
            SignVisionError::NotConfigured(_) => Self::not_configured(),
            SignVisionError::Upstream { provider, message } => {
                let message = redact_sensitive_data(&message);
                warn!(provider = %provider, error = %message, "Vision provider call failed");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    error: "AI processing failed".to_string(),
                    detail: Some(format!("{provider}: {message}")),
                }
            }
            other => {
                let message = redact_sensitive_data(&other.to_string());
                error!(error = %message, "Unexpected error while handling request");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: "Server error".to_string(),
                    detail: Some(message),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status() {
        let cases = [
            (SignVisionError::InvalidInput("no file".into()), StatusCode::BAD_REQUEST),
            (SignVisionError::upstream("gemini", "429 quota"), StatusCode::BAD_GATEWAY),
            (SignVisionError::NotConfigured("no key".into()), StatusCode::SERVICE_UNAVAILABLE),
            (SignVisionError::ConfigError("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn upstream_detail_is_scrubbed() {
        let err = ApiError::from(SignVisionError::upstream(
            "gemini",
            "401 for key AIzaSyA1234567890abcdefghijKLM",
        ));
        let detail = err.detail.unwrap();
        assert!(!detail.contains("AIzaSyA1234567890abcdefghijKLM"));
        assert!(detail.starts_with("gemini: 401"));
    }
}
