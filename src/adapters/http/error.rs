use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::ports::SourceError;

/// Error type for API responses, rendered as `{ "error": ... }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad_request: {0}")]
    BadRequest(String),

    #[error("upstream_error: {0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        Self::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("ticker is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "ticker is required" }));
    }

    #[test]
    fn test_source_errors_are_bad_gateway() {
        let response = ApiError::from(SourceError::RateLimited).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
