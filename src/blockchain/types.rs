// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ScoreChecker read types and the reader seam.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

/// Base mainnet chain id.
pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;

const WEI_PER_ETH: f64 = 1e18;

/// `getScore(user)` result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnchainScore {
    pub score: u64,
    /// Unix seconds of the last accepted attestation, 0 when none exists.
    pub timestamp: u64,
}

impl OnchainScore {
    pub fn exists(&self) -> bool {
        self.timestamp > 0
    }
}

/// `getScoreCard(user)` result, in contract word order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnchainScoreCard {
    pub total_score: u64,
    pub base_score: u64,
    pub security_score: u64,
    pub number_of_transactions: u64,
    pub current_streak: u64,
    pub max_streak: u64,
    /// Wei.
    pub current_balance: U256,
    /// Wei.
    pub avg_balance_last_month: U256,
    /// Wei.
    pub gas_paid: U256,
    pub suspicious_tokens: u64,
    pub suspicious_contracts: u64,
    pub dangerous_interactions: u64,
    pub suspicious_nfts: u64,
    pub last_check_time: u64,
    pub last_issued_at: u64,
}

fn saturating_u64(word: U256) -> u64 {
    u64::try_from(word).unwrap_or(u64::MAX)
}

impl From<[U256; 15]> for OnchainScoreCard {
    fn from(words: [U256; 15]) -> Self {
        let w = |i: usize| saturating_u64(words[i]);
        Self {
            total_score: w(0),
            base_score: w(1),
            security_score: w(2),
            number_of_transactions: w(3),
            current_streak: w(4),
            max_streak: w(5),
            current_balance: words[6],
            avg_balance_last_month: words[7],
            gas_paid: words[8],
            suspicious_tokens: w(9),
            suspicious_contracts: w(10),
            dangerous_interactions: w(11),
            suspicious_nfts: w(12),
            last_check_time: w(13),
            last_issued_at: w(14),
        }
    }
}

/// Convert a wei amount to ETH as a float. Precision loss is acceptable for
/// display.
pub fn wei_to_eth(wei: U256) -> f64 {
    let lossy: f64 = wei.to_string().parse().unwrap_or(0.0);
    lossy / WEI_PER_ETH
}

/// Contract parameters surfaced by `/score/contract_info`. Every read fails
/// open to its zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractParams {
    pub authorized_signer: Address,
    pub check_fee: U256,
    pub min_interval: u64,
    pub max_sig_age: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("ScoreChecker contract address is not configured")]
    ContractNotConfigured,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),
}

/// Read-only view of the ScoreChecker contract and chain head.
#[async_trait]
pub trait ScoreChainReader: Send + Sync {
    fn chain_id(&self) -> u64;

    fn contract(&self) -> Option<Address>;

    /// Replay nonce the contract expects in the next attestation for `user`.
    async fn nonce(&self, user: Address) -> Result<U256, ChainError>;

    async fn authorized_signer(&self) -> Result<Address, ChainError>;

    async fn latest_block_timestamp(&self) -> Result<u64, ChainError>;

    async fn get_score(&self, user: Address) -> Result<OnchainScore, ChainError>;

    async fn get_score_card(&self, user: Address) -> Result<OnchainScoreCard, ChainError>;

    async fn contract_params(&self) -> Result<ContractParams, ChainError>;
}
