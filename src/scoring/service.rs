// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Score computation service: aggregate signals, compose, cache, and read
//! previously attested scores back from chain.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{compose, derive_badges, Badge, BaseBreakdown, ScoreCard, SecurityBreakdown};
use crate::address::address_key;
use crate::blockchain::{wei_to_eth, ChainError, OnchainScore, OnchainScoreCard, ScoreChainReader};
use crate::cache::TtlCache;
use crate::signals::{AggregationCancelled, SignalAggregator, SignalStatus, SignalStatuses};

const CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    Cancelled(#[from] AggregationCancelled),

    #[error("on-chain read failed: {0}")]
    Chain(#[from] ChainError),
}

/// Score data read back from the ScoreChecker contract.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OnchainScoreView {
    pub address: String,
    pub total_score: f64,
    pub base_score: f64,
    pub security_score: f64,
    /// Unix seconds of the attestation the contract accepted.
    pub timestamp: u64,
    pub base: BaseBreakdown,
    pub security: SecurityBreakdown,
}

impl OnchainScoreView {
    /// Build the view from `getScore` plus an optional `getScoreCard`. Without
    /// a card only the headline score is known.
    pub fn new(address: Address, score: OnchainScore, card: Option<&OnchainScoreCard>) -> Self {
        let Some(card) = card else {
            return Self {
                address: address.to_string(),
                total_score: score.score as f64,
                base_score: 0.0,
                security_score: 0.0,
                timestamp: score.timestamp,
                base: empty_base(),
                security: empty_security(),
            };
        };
        let base_score = card.base_score as f64;
        let security_score = card.security_score as f64;
        Self {
            address: address.to_string(),
            total_score: card.total_score as f64,
            base_score,
            security_score,
            timestamp: score.timestamp,
            base: BaseBreakdown {
                tx_count: card.number_of_transactions,
                gas_used: u64::try_from(card.gas_paid).unwrap_or(u64::MAX),
                current_balance: wei_to_eth(card.current_balance),
                past_balance: wei_to_eth(card.avg_balance_last_month),
                current_streak: u32::try_from(card.current_streak).unwrap_or(u32::MAX),
                max_streak: u32::try_from(card.max_streak).unwrap_or(u32::MAX),
                // The contract does not store wallet age.
                age_days: 0,
                base_score,
            },
            security: SecurityBreakdown {
                risky_tokens: card.suspicious_tokens,
                risky_contracts: card.suspicious_contracts,
                risky_signs: card.dangerous_interactions,
                suspicious_nfts: card.suspicious_nfts,
                security_score,
            },
        }
    }

    pub fn into_card(self) -> ScoreCard {
        let ok = SignalStatus::Ok;
        ScoreCard {
            address: self.address,
            name: None,
            total_score: self.total_score,
            base_score: self.base_score,
            security_score: self.security_score,
            base: self.base,
            security: self.security,
            status: SignalStatuses {
                activity: ok,
                tokens: ok,
                contracts: ok,
                approvals: ok,
                nfts: ok,
            },
        }
    }
}

fn empty_base() -> BaseBreakdown {
    BaseBreakdown {
        tx_count: 0,
        gas_used: 0,
        current_balance: 0.0,
        past_balance: 0.0,
        current_streak: 0,
        max_streak: 0,
        age_days: 0,
        base_score: 0.0,
    }
}

fn empty_security() -> SecurityBreakdown {
    SecurityBreakdown {
        risky_tokens: 0,
        risky_contracts: 0,
        risky_signs: 0,
        suspicious_nfts: 0,
        security_score: 0.0,
    }
}

pub struct ScoreService {
    aggregator: SignalAggregator,
    chain: Arc<dyn ScoreChainReader>,
    cache: TtlCache<ScoreCard>,
}

impl ScoreService {
    pub fn new(
        aggregator: SignalAggregator,
        chain: Arc<dyn ScoreChainReader>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            aggregator,
            chain,
            cache: TtlCache::new(CACHE_CAPACITY, cache_ttl),
        }
    }

    /// Aggregate every signal for `address`, compose the card and cache it.
    pub async fn compute(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<ScoreCard, ScoreError> {
        let signals = self.aggregator.aggregate(address, cancel).await?;
        let card = compose(address.to_string(), &signals);
        self.cache.put(&address_key(&address), card.clone());
        info!(
            %address,
            total = card.total_score,
            base = card.base_score,
            security = card.security_score,
            "score computed"
        );
        Ok(card)
    }

    pub fn cached(&self, address: &Address) -> Option<ScoreCard> {
        self.cache.get(&address_key(address))
    }

    /// Previously attested score, or `None` when the contract has no record.
    /// A failed card read degrades to the headline score only.
    pub async fn onchain(&self, address: Address) -> Result<Option<OnchainScoreView>, ScoreError> {
        let score = self.chain.get_score(address).await?;
        if !score.exists() {
            return Ok(None);
        }
        let card = match self.chain.get_score_card(address).await {
            Ok(card) => Some(card),
            Err(err) => {
                warn!(%address, error = %err, "score card read failed, using headline score");
                None
            }
        };
        Ok(Some(OnchainScoreView::new(address, score, card.as_ref())))
    }

    /// Badges from the last computed card, falling back to the on-chain card.
    /// An address with neither has no badges.
    pub async fn badges(&self, address: Address) -> Vec<Badge> {
        if let Some(card) = self.cached(&address) {
            return derive_badges(&card);
        }
        match self.onchain(address).await {
            Ok(Some(view)) => derive_badges(&view.into_card()),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%address, error = %err, "on-chain badge lookup failed");
                Vec::new()
            }
        }
    }
}
