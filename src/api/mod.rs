// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    attestation::{SignedCard, SignedScore},
    auth::AuthenticatedUser,
    models::{BadgesResponse, ContractInfoResponse, NonceResponse, TokenResponse, VerifyRequest},
    scoring::{Badge, BaseBreakdown, OnchainScoreView, ScoreCard, SecurityBreakdown},
    signals::{SignalStatus, SignalStatuses},
    state::AppState,
};

pub mod attestation;
pub mod auth;
pub mod health;
pub mod onchain;
pub mod score;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/nonce", get(auth::nonce))
        .route("/auth/verify", post(auth::verify))
        .route("/score", get(score::score))
        .route("/badges", get(score::badges))
        .route("/score/sign", get(attestation::sign_score))
        .route("/score/sign_card", get(attestation::sign_card))
        .route("/score/contract_info", get(attestation::contract_info))
        .route("/onchain/score", get(onchain::onchain_score))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::nonce,
        auth::verify,
        score::score,
        score::badges,
        attestation::sign_score,
        attestation::sign_card,
        attestation::contract_info,
        onchain::onchain_score
    ),
    components(
        schemas(
            NonceResponse,
            VerifyRequest,
            TokenResponse,
            AuthenticatedUser,
            ScoreCard,
            BaseBreakdown,
            SecurityBreakdown,
            SignalStatus,
            SignalStatuses,
            Badge,
            BadgesResponse,
            OnchainScoreView,
            SignedScore,
            SignedCard,
            ContractInfoResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Wallet sign-in"),
        (name = "Score", description = "Trust scores and badges"),
        (name = "Attestation", description = "EIP-712 attestations for the ScoreChecker contract")
    )
)]
struct ApiDoc;
