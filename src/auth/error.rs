// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Covers both bearer-token validation and the wallet sign-in challenge.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed or fails verification
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token audience is invalid
    InvalidAudience,
    /// Token subject is not a wallet address
    InvalidSubject,
    /// Caller is not an admin
    InsufficientPermissions,
    /// Token subject does not own the requested address
    AddressMismatch,
    /// No outstanding challenge for the address
    ChallengeNotFound,
    /// Challenge outlived its TTL
    ChallengeExpired,
    /// Signature is not `0x` + 130 hex characters
    InvalidSignatureFormat,
    /// Signature does not recover to the claimed address
    SignatureMismatch,
    /// Too many failed sign-in attempts in the current window
    TooManyAttempts { retry_after_secs: u64 },
    /// Required secret is missing from the environment
    NotConfigured(&'static str),
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::AddressMismatch => "address_mismatch",
            AuthError::ChallengeNotFound => "challenge_not_found",
            AuthError::ChallengeExpired => "challenge_expired",
            AuthError::InvalidSignatureFormat => "invalid_signature_format",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::TooManyAttempts { .. } => "too_many_attempts",
            AuthError::NotConfigured(_) => "not_configured",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::InvalidSubject
            | AuthError::ChallengeNotFound
            | AuthError::ChallengeExpired
            | AuthError::InvalidSignatureFormat
            | AuthError::SignatureMismatch => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions | AuthError::AddressMismatch => {
                StatusCode::FORBIDDEN
            }
            AuthError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::NotConfigured(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Invalid token"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::InvalidIssuer => write!(f, "Invalid token issuer"),
            AuthError::InvalidAudience => write!(f, "Invalid token audience"),
            AuthError::InvalidSubject => write!(f, "Invalid token subject"),
            AuthError::InsufficientPermissions => write!(f, "Admin only"),
            AuthError::AddressMismatch => write!(f, "Forbidden: address mismatch"),
            AuthError::ChallengeNotFound => write!(f, "Nonce not found or expired"),
            AuthError::ChallengeExpired => write!(f, "Nonce expired"),
            AuthError::InvalidSignatureFormat => write!(f, "Invalid signature format"),
            AuthError::SignatureMismatch => write!(f, "Invalid signature"),
            AuthError::TooManyAttempts { .. } => {
                write!(f, "Too many failed attempts. Please try again later.")
            }
            AuthError::NotConfigured(what) => write!(f, "{what} not configured"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = match &self {
            AuthError::TooManyAttempts { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
