// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state handed to every handler.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tokio_util::sync::CancellationToken;

use crate::attestation::{
    signer::parse_signer_key, AttestationError, AttestationSigner, NoncePolicy,
};
use crate::auth::challenge::ChallengeService;
use crate::auth::store::{InMemoryNonceStore, InMemoryRateLimitStore};
use crate::auth::token::TokenIssuer;
use crate::blockchain::{client::ScoreCheckerClient, ChainError, ScoreChainReader};
use crate::config::AppConfig;
use crate::providers::explorer::ExplorerClient;
use crate::providers::names::{CachedNameResolver, NoNameResolver};
use crate::providers::portfolio::PortfolioClient;
use crate::providers::ProviderError;
use crate::ratelimit::{KeyedRateLimiter, SharedClock, SystemTimeSource};
use crate::retry::RetryPolicy;
use crate::scoring::ScoreService;
use crate::signals::{
    activity::ActivityCollector, approvals::ApprovalRiskCollector, contracts::ContractRiskCollector,
    nfts::NftRiskCollector, tokens::TokenRiskCollector, SignalAggregator, SignalCollector,
};

const NAME_CACHE_CAPACITY: usize = 10_000;
const NAME_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Errors that prevent the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Signer(#[from] AttestationError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scores: Arc<ScoreService>,
    pub attestations: Arc<AttestationSigner>,
    pub challenges: Arc<ChallengeService>,
    pub tokens: Arc<TokenIssuer>,
    pub chain: Arc<dyn ScoreChainReader>,
    /// Per-caller request throttling for HTTP endpoints.
    pub limiter: Arc<KeyedRateLimiter>,
    pub admins: Arc<HashSet<Address>>,
    /// Cancelled on shutdown; in-flight aggregations observe a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire up the production collaborators described by `config`.
    pub fn from_config(
        config: AppConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, StartupError> {
        let clock: SharedClock = Arc::new(SystemTimeSource);
        let chain: Arc<dyn ScoreChainReader> = Arc::new(ScoreCheckerClient::new(
            &config.rpc_url,
            config.chain_id,
            config.score_checker,
        )?);

        let explorer = Arc::new(ExplorerClient::new(
            config.explorer_api_url.clone(),
            config.token_api_url.clone(),
            config.etherscan_api_key.clone(),
            config.chain_id,
        )?);
        let portfolio = Arc::new(PortfolioClient::new(
            config.portfolio_api_url.clone(),
            &config.zerion_api_key,
        )?);
        let names = Arc::new(CachedNameResolver::new(
            Arc::new(NoNameResolver),
            NAME_CACHE_CAPACITY,
            NAME_CACHE_TTL,
        ));

        let retry = RetryPolicy::default();
        let collectors: Vec<Arc<dyn SignalCollector>> = vec![
            Arc::new(ActivityCollector::new(
                explorer.clone(),
                portfolio,
                names,
                clock.clone(),
                retry,
            )),
            Arc::new(TokenRiskCollector::new(explorer.clone(), retry)),
            Arc::new(ContractRiskCollector::new(explorer.clone(), clock.clone(), retry)),
            Arc::new(ApprovalRiskCollector::new(explorer.clone(), retry)),
            Arc::new(NftRiskCollector::new(explorer, retry)),
        ];

        Ok(Self::assemble(config, chain, collectors, clock, shutdown)?)
    }

    /// Build the services around an already constructed chain reader and
    /// collector set.
    pub fn assemble(
        config: AppConfig,
        chain: Arc<dyn ScoreChainReader>,
        collectors: Vec<Arc<dyn SignalCollector>>,
        clock: SharedClock,
        shutdown: CancellationToken,
    ) -> Result<Self, AttestationError> {
        let key = config.signer_key.as_deref().map(parse_signer_key).transpose()?;
        let limiter = Arc::new(KeyedRateLimiter::new(clock.clone()));

        let aggregator =
            SignalAggregator::new(collectors, config.pool_size, config.collector_timeout);
        let scores = ScoreService::new(aggregator, chain.clone(), config.score_cache_ttl);
        let attestations = AttestationSigner::new(
            chain.clone(),
            key,
            limiter.clone(),
            clock.clone(),
            config.sign_min_interval,
            match config.nonce_hold {
                Some(hold) => NoncePolicy::Lease { hold },
                None => NoncePolicy::Exclusive,
            },
        );
        let challenges = ChallengeService::new(
            Arc::new(InMemoryNonceStore::new()),
            Arc::new(InMemoryRateLimitStore::new()),
            clock,
        );
        let tokens = TokenIssuer::new(config.jwt_secret.as_deref());
        let admins = config.admin_addresses.iter().copied().collect();

        Ok(Self {
            config: Arc::new(config),
            scores: Arc::new(scores),
            attestations: Arc::new(attestations),
            challenges: Arc::new(challenges),
            tokens: Arc::new(tokens),
            chain,
            limiter,
            admins: Arc::new(admins),
            shutdown,
        })
    }

    /// Admins are the configured addresses plus the signer itself.
    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.contains(address) || self.attestations.signer_address() == Some(*address)
    }
}
