// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::{
    address::parse_address,
    auth::OptionalAuth,
    error::ApiError,
    models::AddressQuery,
    scoring::OnchainScoreView,
    state::AppState,
};

/// Read the last attested score for an address from the ScoreChecker
/// contract. Nothing is recomputed.
#[utoipa::path(
    get,
    path = "/v1/onchain/score",
    tag = "Score",
    params(AddressQuery),
    responses(
        (status = 200, description = "On-chain score", body = OnchainScoreView),
        (status = 400, description = "Invalid address"),
        (status = 404, description = "No on-chain score for this address"),
        (status = 503, description = "RPC unavailable")
    )
)]
pub async fn onchain_score(
    OptionalAuth(caller): OptionalAuth,
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<OnchainScoreView>, ApiError> {
    let address = parse_address(&query.address)?;
    debug!(%address, caller = ?caller.map(|c| c.address), "on-chain score lookup");

    state
        .scores
        .onchain(address)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No on-chain score found for this address"))
}
