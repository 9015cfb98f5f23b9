// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sign-in endpoints.
//!
//! Both routes are public: the challenge/response exchange is what
//! establishes identity.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    address::parse_address,
    auth::AuthError,
    error::ApiError,
    models::{NonceQuery, NonceResponse, TokenResponse, VerifyRequest},
    state::AppState,
};

/// Issue a sign-in challenge for a wallet.
///
/// Any previous challenge for the same address is replaced.
#[utoipa::path(
    get,
    path = "/v1/auth/nonce",
    tag = "Auth",
    params(NonceQuery),
    responses(
        (status = 200, description = "Challenge issued", body = NonceResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn nonce(
    State(state): State<AppState>,
    Query(query): Query<NonceQuery>,
) -> Result<Json<NonceResponse>, ApiError> {
    let address = parse_address(&query.address)?;
    let challenge = state.challenges.create_challenge(address).await?;

    Ok(Json(NonceResponse {
        address: challenge.address.to_string(),
        nonce: challenge.message,
        expires_at: challenge.expires_at,
    }))
}

/// Exchange a signed challenge for a session token.
#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signature verified", body = TokenResponse),
        (status = 400, description = "Invalid address"),
        (status = 401, description = "Challenge missing, expired or signature invalid"),
        (status = 429, description = "Too many failed attempts"),
        (status = 500, description = "JWT secret not configured")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !state.tokens.is_configured() {
        return Err(AuthError::NotConfigured("JWT secret").into());
    }
    let address = parse_address(&request.address)?;
    let claims = state
        .challenges
        .verify(address, request.signature.trim())
        .await?;
    let token = state.tokens.issue(&claims)?;

    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::testing::{state, state_with};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn nonce_rejects_bad_address() {
        let err = nonce(
            State(state()),
            Query(NonceQuery {
                address: "0x1234".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_sign_in_yields_verifiable_token() {
        let state = state();
        let wallet = PrivateKeySigner::from_slice(&[0x33; 32]).unwrap();
        let address = wallet.address();

        let Json(challenge) = nonce(
            State(state.clone()),
            Query(NonceQuery {
                address: address.to_string().to_lowercase(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(challenge.address, address.to_string());

        let signature = wallet.sign_message_sync(challenge.nonce.as_bytes()).unwrap();
        let Json(body) = verify(
            State(state.clone()),
            Json(VerifyRequest {
                address: address.to_string(),
                signature: alloy::hex::encode_prefixed(signature.as_bytes()),
            }),
        )
        .await
        .unwrap();

        let user = state.tokens.verify(&body.token).unwrap();
        assert_eq!(user.address, address);
    }

    #[tokio::test]
    async fn verify_without_challenge_is_unauthorized() {
        let err = verify(
            State(state()),
            Json(VerifyRequest {
                address: format!("{:#x}", alloy::primitives::Address::repeat_byte(7)),
                signature: format!("0x{}", "ab".repeat(65)),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verify_requires_jwt_secret() {
        let state = state_with(AppConfig::default(), Default::default());
        let err = verify(
            State(state),
            Json(VerifyRequest {
                address: format!("{:#x}", alloy::primitives::Address::repeat_byte(7)),
                signature: "0x".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
