// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Behavioral and Risk Signals
//!
//! Five independent collectors each compute one dimension of a wallet's
//! trust profile from explorer and portfolio data:
//!
//! | Collector | Output |
//! |-----------|--------|
//! | [`activity::ActivityCollector`] | [`ActivitySnapshot`] |
//! | [`tokens::TokenRiskCollector`] | [`RiskSignal`] (risky ERC-20 contracts) |
//! | [`contracts::ContractRiskCollector`] | [`RiskSignal`] (risky contract interactions) |
//! | [`approvals::ApprovalRiskCollector`] | [`RiskSignal`] (risky approvals/signatures) |
//! | [`nfts::NftRiskCollector`] | [`RiskSignal`] (suspicious NFT collections) |
//!
//! The [`aggregator::SignalAggregator`] runs them concurrently and merges
//! their outputs into a [`SignalSet`]. A collector that fails or times out
//! contributes its neutral default, recorded with a non-`Ok` status.

pub mod activity;
pub mod aggregator;
pub mod approvals;
pub mod contracts;
pub mod nfts;
pub mod tokens;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::providers::ProviderError;

pub use aggregator::{AggregationCancelled, SignalAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Activity,
    Tokens,
    Contracts,
    Approvals,
    Nfts,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Tokens => "tokens",
            Self::Contracts => "contracts",
            Self::Approvals => "approvals",
            Self::Nfts => "nfts",
        }
    }
}

/// How a collector settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Ok,
    TimedOut,
    Error,
}

/// Base-score inputs gathered by the activity collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ActivitySnapshot {
    pub tx_count: u64,
    /// Sum of `gasUsed` over transactions sent by the address.
    pub gas_used: u64,
    /// Current Base portfolio value (USD).
    pub current_balance: f64,
    /// Average Base portfolio value over the last month (USD).
    pub past_balance: f64,
    pub current_streak: u32,
    pub max_streak: u32,
    pub age_days: u32,
    /// Reverse-resolved Basename, if any.
    pub name: Option<String>,
}

/// Output of a risk collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct RiskSignal {
    /// Number of risky items found.
    pub count: u64,
    /// Deduction weight fed into the security score.
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectorOutput {
    Activity(ActivitySnapshot),
    Risk(RiskSignal),
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// One signal source.
#[async_trait]
pub trait SignalCollector: Send + Sync {
    fn kind(&self) -> SignalKind;

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError>;
}

/// A collector value together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalResult<T> {
    pub value: T,
    pub status: SignalStatus,
}

impl<T: Default> SignalResult<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            status: SignalStatus::Ok,
        }
    }

    /// Neutral default carrying the failure status.
    pub fn neutral(status: SignalStatus) -> Self {
        Self {
            value: T::default(),
            status,
        }
    }
}

/// Per-collector settle status, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SignalStatuses {
    pub activity: SignalStatus,
    pub tokens: SignalStatus,
    pub contracts: SignalStatus,
    pub approvals: SignalStatus,
    pub nfts: SignalStatus,
}

/// Merged output of all collectors for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub activity: SignalResult<ActivitySnapshot>,
    pub tokens: SignalResult<RiskSignal>,
    pub contracts: SignalResult<RiskSignal>,
    pub approvals: SignalResult<RiskSignal>,
    pub nfts: SignalResult<RiskSignal>,
}

impl SignalSet {
    /// Every slot at its neutral default with the given status.
    pub fn neutral(status: SignalStatus) -> Self {
        Self {
            activity: SignalResult::neutral(status),
            tokens: SignalResult::neutral(status),
            contracts: SignalResult::neutral(status),
            approvals: SignalResult::neutral(status),
            nfts: SignalResult::neutral(status),
        }
    }

    /// Record a successful collector output. Returns `false` if the output
    /// shape does not match the slot.
    pub fn record(&mut self, kind: SignalKind, output: CollectorOutput) -> bool {
        match (kind, output) {
            (SignalKind::Activity, CollectorOutput::Activity(snapshot)) => {
                self.activity = SignalResult::ok(snapshot);
            }
            (SignalKind::Tokens, CollectorOutput::Risk(risk)) => {
                self.tokens = SignalResult::ok(risk)
            }
            (SignalKind::Contracts, CollectorOutput::Risk(risk)) => {
                self.contracts = SignalResult::ok(risk)
            }
            (SignalKind::Approvals, CollectorOutput::Risk(risk)) => {
                self.approvals = SignalResult::ok(risk)
            }
            (SignalKind::Nfts, CollectorOutput::Risk(risk)) => self.nfts = SignalResult::ok(risk),
            _ => return false,
        }
        true
    }

    /// Reset a slot to its neutral default with a failure status.
    pub fn degrade(&mut self, kind: SignalKind, status: SignalStatus) {
        match kind {
            SignalKind::Activity => self.activity = SignalResult::neutral(status),
            SignalKind::Tokens => self.tokens = SignalResult::neutral(status),
            SignalKind::Contracts => self.contracts = SignalResult::neutral(status),
            SignalKind::Approvals => self.approvals = SignalResult::neutral(status),
            SignalKind::Nfts => self.nfts = SignalResult::neutral(status),
        }
    }

    pub fn statuses(&self) -> SignalStatuses {
        SignalStatuses {
            activity: self.activity.status,
            tokens: self.tokens.status,
            contracts: self.contracts.status,
            approvals: self.approvals.status,
            nfts: self.nfts.status,
        }
    }
}

/// Suspicious address shapes: `dead` or any repeated hex digit quad.
pub(crate) fn has_suspicious_address_pattern(address: &str) -> bool {
    let lower = address.to_lowercase();
    if lower.contains("dead") {
        return true;
    }
    const QUADS: [&str; 16] = [
        "0000", "1111", "2222", "3333", "4444", "5555", "6666", "7777", "8888", "9999", "aaaa",
        "bbbb", "cccc", "dddd", "eeee", "ffff",
    ];
    QUADS.iter().any(|q| lower.contains(q))
}

/// First pattern contained in either `name` or `symbol` (both lowercased by caller).
pub(crate) fn first_match<'a>(patterns: &[&'a str], name: &str, symbol: &str) -> Option<&'a str> {
    patterns
        .iter()
        .copied()
        .find(|p| name.contains(p) || symbol.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_matches_slot_shape() {
        let mut set = SignalSet::neutral(SignalStatus::Error);
        let risk = RiskSignal {
            count: 2,
            weighted_score: 0.01,
        };
        assert!(set.record(SignalKind::Tokens, CollectorOutput::Risk(risk)));
        assert_eq!(set.tokens, SignalResult::ok(risk));
        assert!(!set.record(SignalKind::Activity, CollectorOutput::Risk(risk)));
        assert_eq!(set.activity.status, SignalStatus::Error);
    }

    #[test]
    fn degrade_resets_to_neutral() {
        let mut set = SignalSet::neutral(SignalStatus::Ok);
        set.record(
            SignalKind::Nfts,
            CollectorOutput::Risk(RiskSignal {
                count: 4,
                weighted_score: 0.0,
            }),
        );
        set.degrade(SignalKind::Nfts, SignalStatus::TimedOut);
        assert_eq!(set.nfts.value, RiskSignal::default());
        assert_eq!(set.statuses().nfts, SignalStatus::TimedOut);
    }

    #[test]
    fn suspicious_patterns() {
        assert!(has_suspicious_address_pattern("0x000000000000000000000000000000000000dEaD"));
        assert!(has_suspicious_address_pattern("0x12341111abcd"));
        assert!(!has_suspicious_address_pattern("0x1234567890abcdef1234567890abcdef12345678"));
    }

    #[test]
    fn first_match_checks_name_and_symbol() {
        let patterns = ["moon", "inu"];
        assert_eq!(first_match(&patterns, "shiba inu", "shib"), Some("inu"));
        assert_eq!(first_match(&patterns, "usd coin", "moonusd"), Some("moon"));
        assert_eq!(first_match(&patterns, "usd coin", "usdc"), None);
    }
}
