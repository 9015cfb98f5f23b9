// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed score attestations.
//!
//! An attestation binds a user address, score fields, an issuance time and
//! the contract's replay nonce under the `BaseBadgeScore` EIP-712 domain. The
//! caller submits it on-chain; nothing here is persisted beyond the nonce
//! ledger that guards against issuing the same nonce twice.

pub mod signer;
pub mod typed_data;

use crate::address::ValidationError;

pub use signer::{AttestationError, AttestationSigner, NoncePolicy, SignedCard, SignedScore};

/// Upper bound for every score field.
pub const MAX_SCORE: u64 = 1_000_000;

const WEI_PER_ETH: f64 = 1e18;

/// Raw `ScoreCard` inputs as received from a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CardInput {
    pub total_score: f64,
    pub base_score: f64,
    pub security_score: f64,
    pub tx_count: i64,
    pub current_streak: i64,
    pub max_streak: i64,
    /// ETH.
    pub current_balance: f64,
    /// ETH.
    pub avg_balance_last_month: f64,
    /// ETH.
    pub gas_paid: f64,
    pub suspicious_tokens: i64,
    pub suspicious_contracts: i64,
    pub dangerous_interactions: i64,
    pub suspicious_nfts: i64,
}

/// `ScoreCard` fields in the integer domain the contract stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizedCard {
    pub total_score: u64,
    pub base_score: u64,
    pub security_score: u64,
    pub tx_count: u64,
    pub current_streak: u64,
    pub max_streak: u64,
    pub current_balance_wei: u128,
    pub avg_balance_wei: u128,
    pub gas_paid_wei: u128,
    pub suspicious_tokens: u64,
    pub suspicious_contracts: u64,
    pub dangerous_interactions: u64,
    pub suspicious_nfts: u64,
}

/// Validate a score against `[0, MAX_SCORE]` and round it to an integer.
pub fn normalize_score(field: &'static str, value: f64) -> Result<u64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber(field));
    }
    if !(0.0..=MAX_SCORE as f64).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            max: MAX_SCORE,
        });
    }
    // Rounding cannot leave the range, the clamp only guards float edges.
    Ok((value.round() as u64).min(MAX_SCORE))
}

fn count(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::Negative(field))
}

/// Truncating ETH to wei conversion.
fn wei(field: &'static str, eth: f64) -> Result<u128, ValidationError> {
    if !eth.is_finite() || eth < 0.0 {
        return Err(ValidationError::NotANumber(field));
    }
    Ok((eth * WEI_PER_ETH) as u128)
}

impl CardInput {
    pub fn normalize(&self) -> Result<NormalizedCard, ValidationError> {
        Ok(NormalizedCard {
            total_score: normalize_score("total_score", self.total_score)?,
            base_score: normalize_score("base_score", self.base_score)?,
            security_score: normalize_score("security_score", self.security_score)?,
            tx_count: count("tx_count", self.tx_count)?,
            current_streak: count("current_streak", self.current_streak)?,
            max_streak: count("max_streak", self.max_streak)?,
            current_balance_wei: wei("current_balance", self.current_balance)?,
            avg_balance_wei: wei("avg_balance_last_month", self.avg_balance_last_month)?,
            gas_paid_wei: wei("gas_paid", self.gas_paid)?,
            suspicious_tokens: count("suspicious_tokens", self.suspicious_tokens)?,
            suspicious_contracts: count("suspicious_contracts", self.suspicious_contracts)?,
            dangerous_interactions: count("dangerous_interactions", self.dangerous_interactions)?,
            suspicious_nfts: count("suspicious_nfts", self.suspicious_nfts)?,
        })
    }
}
