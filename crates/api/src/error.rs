//! HTTP mapping of application errors.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use mediagate_core::assets::AssetError;
use mediagate_shared::{AppError, JwtError};

/// Handler error rendered as `{"error": CODE, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Shorthand for a `BadRequest` error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::BadRequest(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        Self(err.into())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let code = err.error_code();

        if err.is_server_error() {
            error!(error = %err, code, "Request failed");
        } else {
            debug!(error = %err, code, "Request rejected");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (
            status,
            Json(json!({
                "error": code,
                "message": err.public_message(),
            })),
        )
            .into_response();

        if let AppError::TooManyRequests {
            retry_after_secs, ..
        } = err
        {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use mediagate_core::storage::StorageError;

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unauthenticated_hides_reason() {
        let (status, body) = render(JwtError::Expired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHENTICATED");
        assert!(!body["message"].as_str().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn test_storage_failure_hides_backend_detail() {
        let err = AssetError::Storage(StorageError::operation("s3: SignatureDoesNotMatch"));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "STORAGE_UNAVAILABLE");
        assert!(!body["message"].as_str().unwrap().contains("SignatureDoesNotMatch"));
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let err = ApiError(AppError::TooManyRequests {
            client: "ip:10.0.0.1".into(),
            retry_after_secs: 42,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_payload_too_large_is_bad_request() {
        let (status, body) = render(AssetError::payload_too_large(11, 10).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    }
}
