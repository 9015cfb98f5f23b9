// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for session-token authentication.
//!
//! Use the `Auth` extractor in handlers to require a signed-in wallet:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.address is the verified wallet
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor for a wallet holding a valid session token.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.tokens.verify(token)?;
        Ok(Auth(user))
    }
}

/// Extractor that additionally requires an admin wallet.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !state.is_admin(&user.address) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid authentication is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::tests::token_for;
    use crate::state::testing::{admin, state};
    use alloy::primitives::Address;
    use axum::http::Request;

    fn parts_with(auth: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = state();
        let mut parts = parts_with(None);
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer() {
        let state = state();
        let mut parts = parts_with(Some("Basic abc".into()));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_token() {
        let state = state();
        let wallet = Address::repeat_byte(0x42);
        let mut parts = parts_with(Some(format!("Bearer {}", token_for(&wallet))));
        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.address, wallet);
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let state = state();
        let mut parts = parts_with(Some(format!(
            "Bearer {}",
            token_for(&Address::repeat_byte(0x42))
        )));
        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_configured_admin() {
        let state = state();
        let mut parts = parts_with(Some(format!("Bearer {}", token_for(&admin()))));
        let AdminOnly(user) = AdminOnly::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.address, admin());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_user() {
        let state = state();
        let mut parts = parts_with(Some("Bearer not-a-jwt".into()));
        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_none());
    }
}
