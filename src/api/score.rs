// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Score computation and badge endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::{
    address::{address_key, parse_address},
    auth::{AdminOnly, Auth, AuthError},
    error::ApiError,
    models::{AddressQuery, BadgesResponse},
    ratelimit::Quota,
    scoring::ScoreCard,
    state::AppState,
};

/// Compute the trust score for an address.
///
/// Runs every signal collector, composes the card and caches it for the
/// badge endpoint. Limited to one request per interval per caller.
#[utoipa::path(
    get,
    path = "/v1/score",
    tag = "Score",
    security(("bearer_auth" = [])),
    params(AddressQuery),
    responses(
        (status = 200, description = "Score computed", body = ScoreCard),
        (status = 400, description = "Invalid address"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn score(
    AdminOnly(caller): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<ScoreCard>, ApiError> {
    let address = parse_address(&query.address)?;

    let key = format!("score:{}", address_key(&caller.address));
    let decision = state
        .limiter
        .check(&key, Quota::min_interval(state.config.score_min_interval));
    if !decision.allowed {
        return Err(ApiError::too_many_requests("Rate limit exceeded")
            .with_retry_after(decision.retry_after_secs()));
    }

    info!(%address, caller = %caller.address, "score requested");
    let cancel = state.shutdown.child_token();
    let card = state.scores.compute(address, &cancel).await?;
    Ok(Json(card))
}

/// Badges earned by an address.
///
/// Uses the last computed score card, or the card stored on-chain when none
/// is cached. Callers may only query their own address unless they are admins.
#[utoipa::path(
    get,
    path = "/v1/badges",
    tag = "Score",
    security(("bearer_auth" = [])),
    params(AddressQuery),
    responses(
        (status = 200, description = "Badges for the address", body = BadgesResponse),
        (status = 400, description = "Invalid address"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Address mismatch")
    )
)]
pub async fn badges(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<BadgesResponse>, ApiError> {
    let address = parse_address(&query.address)?;
    if !user.owns(&address) && !state.is_admin(&user.address) {
        return Err(AuthError::AddressMismatch.into());
    }

    let badges = state.scores.badges(address).await;
    Ok(Json(BadgesResponse {
        address: address.to_string(),
        badges,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::blockchain::testing::FakeChain;
    use crate::blockchain::{OnchainScore, OnchainScoreCard};
    use crate::state::testing::{admin, config, contract, state, state_with};
    use alloy::primitives::Address;
    use axum::http::StatusCode;

    fn user(address: Address) -> AuthenticatedUser {
        AuthenticatedUser {
            address,
            expires_at: i64::MAX,
        }
    }

    fn query(address: Address) -> Query<AddressQuery> {
        Query(AddressQuery {
            address: address.to_string(),
        })
    }

    #[tokio::test]
    async fn score_is_limited_per_caller() {
        let state = state();
        let target = Address::repeat_byte(0x11);

        let Json(card) = score(AdminOnly(user(admin())), State(state.clone()), query(target))
            .await
            .unwrap();
        assert_eq!(card.address, target.to_string());
        assert!(state.scores.cached(&target).is_some());

        let err = score(AdminOnly(user(admin())), State(state.clone()), query(target))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after_secs, Some(1));
    }

    #[tokio::test]
    async fn score_during_shutdown_is_unavailable() {
        let state = state();
        state.shutdown.cancel();
        let err = score(
            AdminOnly(user(admin())),
            State(state),
            query(Address::repeat_byte(0x11)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn badges_enforce_ownership() {
        let state = state();
        let me = Address::repeat_byte(0x22);
        let other = Address::repeat_byte(0x33);

        let err = badges(Auth(user(me)), State(state.clone()), query(other))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let Json(body) = badges(Auth(user(me)), State(state.clone()), query(me))
            .await
            .unwrap();
        assert!(body.badges.is_empty());

        // Admins may look at anyone.
        assert!(badges(Auth(user(admin())), State(state), query(other))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn badges_fall_back_to_chain() {
        let me = Address::repeat_byte(0x22);
        let mut chain = FakeChain::with_contract(contract());
        chain.scores.insert(
            me,
            (
                OnchainScore {
                    score: 90,
                    timestamp: 1_700_000_000,
                },
                OnchainScoreCard {
                    total_score: 90,
                    base_score: 66,
                    security_score: 24,
                    number_of_transactions: 120,
                    ..Default::default()
                },
            ),
        );
        let state = state_with(config(), chain);

        let Json(body) = badges(Auth(user(me)), State(state), query(me)).await.unwrap();
        let earned: Vec<_> = body.badges.iter().filter(|b| b.earned).map(|b| b.id).collect();
        assert!(earned.contains(&"total_gold"));
        assert!(earned.contains(&"tx_100"));
        assert!(earned.contains(&"security_master"));
        assert!(!earned.contains(&"veteran"));
    }
}
