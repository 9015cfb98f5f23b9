// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic score composition.
//!
//! `base_score` is a sum of capped linear terms (max 95). `security_score`
//! starts from a 25 point budget minus capped risk deductions and never goes
//! below zero. Non-finite or negative inputs contribute nothing.

use serde::Serialize;
use utoipa::ToSchema;

use super::round2;
use crate::signals::{activity::is_verified_name, SignalSet, SignalStatuses};

pub const SECURITY_BUDGET: f64 = 25.0;
pub const MAX_BASE_SCORE: f64 = 95.0;
pub const NAME_BONUS: f64 = 5.0;

/// Inputs to the base score, already coerced to numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaseInputs {
    pub tx_count: f64,
    pub gas_used: f64,
    pub current_balance: f64,
    pub past_balance: f64,
    pub current_streak: f64,
    pub max_streak: f64,
    pub age_days: f64,
    pub has_verified_name: bool,
}

/// Deduction weights feeding the security score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskInputs {
    pub tokens_weight: f64,
    pub contracts_weight: f64,
    pub signs_weight: f64,
    pub nft_count: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub base: f64,
    pub security: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BaseBreakdown {
    pub tx_count: u64,
    pub gas_used: u64,
    pub current_balance: f64,
    pub past_balance: f64,
    pub current_streak: u32,
    pub max_streak: u32,
    pub age_days: u32,
    pub base_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SecurityBreakdown {
    pub risky_tokens: u64,
    pub risky_contracts: u64,
    pub risky_signs: u64,
    pub suspicious_nfts: u64,
    pub security_score: f64,
}

/// Composed trust score for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScoreCard {
    /// EIP-55 checksummed address.
    pub address: String,
    /// Verified or unverified Basename, if one resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_score: f64,
    pub base_score: f64,
    pub security_score: f64,
    pub base: BaseBreakdown,
    pub security: SecurityBreakdown,
    /// How each collector settled.
    pub status: SignalStatuses,
}

fn num(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn capped(value: f64, threshold: f64, points: f64) -> f64 {
    (num(value) / threshold).min(1.0) * points
}

/// Unrounded base score.
pub fn base_score(inputs: &BaseInputs) -> f64 {
    let bonus = if inputs.has_verified_name { NAME_BONUS } else { 0.0 };
    capped(inputs.tx_count, 1_000.0, 15.0)
        + capped(inputs.gas_used, 1e7, 10.0)
        + capped(inputs.current_balance, 10.0, 15.0)
        + capped(inputs.past_balance, 10.0, 10.0)
        + capped(inputs.current_streak, 30.0, 10.0)
        + capped(inputs.max_streak, 90.0, 10.0)
        + capped(inputs.age_days, 365.0, 10.0)
        + bonus
}

/// Security score rounded to 2 decimals, floored at 0.
pub fn security_score(risk: &RiskInputs) -> f64 {
    let score = SECURITY_BUDGET
        - num(risk.tokens_weight).min(3.0)
        - num(risk.contracts_weight).min(12.0)
        - num(risk.signs_weight).min(6.0)
        - (num(risk.nft_count) * 0.01).min(1.0);
    round2(score).max(0.0)
}

/// Compose the three headline numbers. `total` equals the rounded sum of the
/// reported (rounded) base and security scores.
pub fn compose_scores(base: &BaseInputs, risk: &RiskInputs) -> Scores {
    let base = round2(base_score(base));
    let security = security_score(risk);
    Scores {
        base,
        security,
        total: round2(base + security),
    }
}

impl BaseInputs {
    pub fn from_signals(signals: &SignalSet) -> Self {
        let a = &signals.activity.value;
        Self {
            tx_count: a.tx_count as f64,
            gas_used: a.gas_used as f64,
            current_balance: a.current_balance,
            past_balance: a.past_balance,
            current_streak: f64::from(a.current_streak),
            max_streak: f64::from(a.max_streak),
            age_days: f64::from(a.age_days),
            has_verified_name: a.name.as_deref().is_some_and(is_verified_name),
        }
    }
}

impl RiskInputs {
    pub fn from_signals(signals: &SignalSet) -> Self {
        Self {
            tokens_weight: signals.tokens.value.weighted_score,
            contracts_weight: signals.contracts.value.weighted_score,
            signs_weight: signals.approvals.value.weighted_score,
            nft_count: signals.nfts.value.count as f64,
        }
    }
}

/// Build the full card for `address` from merged signals.
pub fn compose(address: String, signals: &SignalSet) -> ScoreCard {
    let scores = compose_scores(
        &BaseInputs::from_signals(signals),
        &RiskInputs::from_signals(signals),
    );
    let a = &signals.activity.value;
    ScoreCard {
        address,
        name: a.name.clone(),
        total_score: scores.total,
        base_score: scores.base,
        security_score: scores.security,
        base: BaseBreakdown {
            tx_count: a.tx_count,
            gas_used: a.gas_used,
            current_balance: num(a.current_balance),
            past_balance: num(a.past_balance),
            current_streak: a.current_streak,
            max_streak: a.max_streak,
            age_days: a.age_days,
            base_score: scores.base,
        },
        security: SecurityBreakdown {
            risky_tokens: signals.tokens.value.count,
            risky_contracts: signals.contracts.value.count,
            risky_signs: signals.approvals.value.count,
            suspicious_nfts: signals.nfts.value.count,
            security_score: scores.security,
        },
        status: signals.statuses(),
    }
}
