// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation signing endpoints.
//!
//! The signed payloads are submitted to the ScoreChecker contract by the
//! client. Signing is admin-only; contract parameters are public.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{info, warn};

use crate::{
    address::parse_address,
    attestation::{SignedCard, SignedScore},
    auth::AdminOnly,
    blockchain::ChainError,
    error::ApiError,
    models::{ContractInfoResponse, OptionalAddressQuery, SignCardQuery, SignScoreQuery},
    state::AppState,
};

/// Sign a `Score` attestation.
#[utoipa::path(
    get,
    path = "/v1/score/sign",
    tag = "Attestation",
    security(("bearer_auth" = [])),
    params(SignScoreQuery),
    responses(
        (status = 200, description = "Signed attestation", body = SignedScore),
        (status = 400, description = "Invalid address or score"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 429, description = "Rate limit exceeded or nonce awaiting submission"),
        (status = 500, description = "Signer or contract not configured")
    )
)]
pub async fn sign_score(
    AdminOnly(caller): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<SignScoreQuery>,
) -> Result<Json<SignedScore>, ApiError> {
    let address = parse_address(&query.address)?;
    info!(%address, caller = %caller.address, "score attestation requested");
    let signed = state.attestations.sign_score(address, query.score).await?;
    Ok(Json(signed))
}

/// Sign a full `ScoreCard` attestation. Balances are given in ETH.
#[utoipa::path(
    get,
    path = "/v1/score/sign_card",
    tag = "Attestation",
    security(("bearer_auth" = [])),
    params(SignCardQuery),
    responses(
        (status = 200, description = "Signed attestation", body = SignedCard),
        (status = 400, description = "Invalid address or card field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 429, description = "Rate limit exceeded or nonce awaiting submission"),
        (status = 500, description = "Signer or contract not configured")
    )
)]
pub async fn sign_card(
    AdminOnly(caller): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<SignCardQuery>,
) -> Result<Json<SignedCard>, ApiError> {
    let address = parse_address(&query.address)?;
    info!(%address, caller = %caller.address, "score card attestation requested");
    let signed = state
        .attestations
        .sign_card(address, &query.card_input())
        .await?;
    Ok(Json(signed))
}

/// Read ScoreChecker parameters, and the replay nonce of an address if given.
#[utoipa::path(
    get,
    path = "/v1/score/contract_info",
    tag = "Attestation",
    params(OptionalAddressQuery),
    responses(
        (status = 200, description = "Contract parameters", body = ContractInfoResponse),
        (status = 400, description = "Invalid address"),
        (status = 500, description = "Contract not configured")
    )
)]
pub async fn contract_info(
    State(state): State<AppState>,
    Query(query): Query<OptionalAddressQuery>,
) -> Result<Json<ContractInfoResponse>, ApiError> {
    let user = query.address.as_deref().map(parse_address).transpose()?;
    let contract = state.chain.contract().ok_or(ChainError::ContractNotConfigured)?;
    let params = state.chain.contract_params().await?;

    let nonce = match user {
        Some(user) => Some(match state.chain.nonce(user).await {
            Ok(nonce) => u128::try_from(nonce).unwrap_or(u128::MAX),
            Err(err) => {
                warn!(%user, error = %err, "nonce read failed, reporting 0");
                0
            }
        }),
        None => None,
    };

    Ok(Json(ContractInfoResponse {
        rpc: state.config.rpc_url.clone(),
        chain_id: state.chain.chain_id(),
        contract: contract.to_string(),
        authorized_signer_onchain: params.authorized_signer.to_string(),
        check_fee: params.check_fee.to_string(),
        min_interval: params.min_interval,
        max_sig_age: params.max_sig_age,
        nonce,
    }))
}
