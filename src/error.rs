// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::address::ValidationError;
use crate::attestation::AttestationError;
use crate::auth::AuthError;
use crate::blockchain::ChainError;
use crate::scoring::ScoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Sent as `Retry-After` on throttled responses.
    pub retry_after_secs: Option<u64>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<AttestationError> for ApiError {
    fn from(err: AttestationError) -> Self {
        match err {
            AttestationError::Validation(e) => e.into(),
            AttestationError::RateLimited { retry_after_secs }
            | AttestationError::NonceInFlight {
                retry_after_secs, ..
            } => Self::too_many_requests(err.to_string()).with_retry_after(retry_after_secs),
            AttestationError::NotConfigured(_) | AttestationError::Signing(_) => {
                tracing::error!(error = %err, "attestation signing unavailable");
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let api = Self::new(err.status_code(), err.to_string());
        match err {
            AuthError::TooManyAttempts { retry_after_secs } => {
                api.with_retry_after(retry_after_secs)
            }
            _ => api,
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::ContractNotConfigured => Self::internal(err.to_string()),
            _ => {
                tracing::warn!(error = %err, "on-chain read failed");
                Self::service_unavailable(err.to_string())
            }
        }
    }
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::Cancelled(_) => Self::service_unavailable("Server is shutting down"),
            ScoreError::Chain(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let limited = ApiError::too_many_requests("slow down");
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

        let internal = ApiError::internal("boom");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "boom");
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err: ApiError = ValidationError::InvalidAddress("0x12".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("0x12"));
    }

    #[test]
    fn attestation_errors_map_to_taxonomy() {
        let err: ApiError = AttestationError::Validation(ValidationError::OutOfRange {
            field: "score",
            max: 1_000_000,
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = AttestationError::RateLimited { retry_after_secs: 2 }.into();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after_secs, Some(2));

        let err: ApiError = AttestationError::NotConfigured("Signer").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Signer not configured");
    }

    #[test]
    fn cancelled_scores_are_unavailable() {
        let err: ApiError = ScoreError::Cancelled(crate::signals::AggregationCancelled).into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn lockout_keeps_status_and_retry_after() {
        let err: ApiError = AuthError::TooManyAttempts {
            retry_after_secs: 90,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "90");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
