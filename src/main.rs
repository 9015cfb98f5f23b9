// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use basebadge_rust_server::{api::router, config::AppConfig, logging, state::AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if config.signer_key.is_none() || config.score_checker.is_none() {
        warn!("signer key or ScoreChecker address missing, attestation endpoints will fail");
    }
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET missing, sign-in is disabled");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let state = match AppState::from_config(config, shutdown.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to initialise services");
            return ExitCode::FAILURE;
        }
    };
    info!(
        chain_id = state.chain.chain_id(),
        contract = ?state.chain.contract(),
        signer = ?state.attestations.signer_address(),
        admins = state.admins.len(),
        "services initialised"
    );

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(%addr, "BaseBadge server listening (docs at /docs)");

    let app = router(state);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await;

    match served {
        Ok(()) => {
            info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

/// Wait for Ctrl-C or SIGTERM, then cancel in-flight aggregations.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    token.cancel();
}
