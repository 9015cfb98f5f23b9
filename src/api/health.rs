// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
///
/// Each value is `"ok"` or `"not_configured"`. Missing secrets only disable
/// the routes that need them, so they degrade readiness without failing it.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Attestation signing key.
    pub signer: String,
    /// Session token secret.
    pub jwt: String,
    /// ScoreChecker contract address.
    pub contract: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check(configured: bool) -> String {
    if configured { "ok" } else { "not_configured" }.to_string()
}

/// Health check endpoint handler.
///
/// Always 200; `status` is "degraded" when a secret is missing.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let signer = state.attestations.signer_address().is_some();
    let jwt = state.tokens.is_configured();
    let contract = state.chain.contract().is_some();
    let all_ok = signer && jwt && contract;

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            signer: check(signer),
            jwt: check(jwt),
            contract: check(contract),
        },
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 503 while shutting down so load balancers drain this replica.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is shutting down", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let shutting_down = state.shutdown.is_cancelled();
    let (status, Json(mut response)) = health(state).await;
    if shutting_down {
        response.status = "shutting_down".to_string();
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response));
    }
    (status, Json(response))
}
