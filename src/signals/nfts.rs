// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Suspicious NFT collections minted or received by the wallet.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::debug;

use super::{first_match, CollectorError, CollectorOutput, RiskSignal, SignalCollector, SignalKind};
use crate::address::address_key;
use crate::providers::{ChainDataProvider, TokenTransfer};
use crate::retry::{with_backoff, RetryPolicy};

const HIGH_RISK_PATTERNS: &[&str] = &[
    "honeypot", "scam", "fake", "rug", "suspicious", "phishing", "malware", "virus", "trojan",
    "stealer", "drainer", "drain", "clone_", "copy_", "replica_",
];

const LURE_PATTERNS: &[&str] = &[
    "claim", "airdrop", "reward", "free", "gift", "bonus", "earn", "profit", "mint", "mintable",
    "mintpass", "whitelist", "presale", "private", "exclusive",
];

const HYPE_PATTERNS: &[&str] = &[
    "limited", "rare", "unique", "special", "vip", "golden", "premium", "elite", "legendary",
    "mythic",
];

const FAKE_BLUE_CHIPS: &[&str] = &[
    "bored ape", "cryptopunk", "azuki", "doodles", "moonbird", "clone x", "pudgy penguin",
    "mutant ape", "bayc", "mayc",
];

const LEGITIMATE_BASE_COLLECTIONS: &[&str] = &[
    "0x4ed4e862860bed51a9570b96d89af5e1b0efefed", // DEGEN
    "0x03a520b32c04bf3beef7beb72e919cf822ed34f1", // Base, Introduced
];

const KNOWN_SCAM_NFTS: &[&str] = &["0x1234567890123456789012345678901234567890"];

/// Deduction per suspicious collection (applied by the composer, capped at 1).
pub const WEIGHT_PER_NFT: f64 = 0.01;

pub struct NftRiskCollector {
    chain: Arc<dyn ChainDataProvider>,
    retry: RetryPolicy,
}

impl NftRiskCollector {
    pub fn new(chain: Arc<dyn ChainDataProvider>, retry: RetryPolicy) -> Self {
        Self { chain, retry }
    }
}

#[async_trait]
impl SignalCollector for NftRiskCollector {
    fn kind(&self) -> SignalKind {
        SignalKind::Nfts
    }

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError> {
        let transfers = with_backoff("explorer.tokennfttx", self.retry, || {
            self.chain.nft_transfers(address)
        })
        .await?;
        let signal = assess(&address_key(&address), &transfers);
        debug!(%address, suspicious = signal.count, "nft risk assessed");
        Ok(CollectorOutput::Risk(signal))
    }
}

/// Score one collection from its first observed transfer.
pub fn nft_risk_score(address_lower: &str, transfer: &TokenTransfer) -> u32 {
    let name = transfer.token_name.to_lowercase();
    let symbol = transfer.token_symbol.to_lowercase();
    let mut score: u32 = 0;

    if transfer.from == address_lower {
        score += 30;
    } else if transfer.to == address_lower {
        score += 15;
    }
    if KNOWN_SCAM_NFTS.contains(&transfer.contract_address.as_str()) {
        score += 50;
    }
    if first_match(HIGH_RISK_PATTERNS, &name, &symbol).is_some() {
        score += 40;
    }
    if first_match(LURE_PATTERNS, &name, &symbol).is_some() {
        score += 25;
    }
    if first_match(HYPE_PATTERNS, &name, &symbol).is_some() {
        score += 8;
    }
    if first_match(FAKE_BLUE_CHIPS, &name, &symbol).is_some() {
        score += 35;
    }
    if symbol.chars().count() > 20 {
        score += 15;
    }
    if transfer.value == "0" {
        score += 20;
    } else if transfer
        .value
        .parse::<u128>()
        .map(|v| v < 1_000_000)
        .unwrap_or(false)
    {
        score += 15;
    }
    if transfer.token_id.len() > 10 {
        score += 10;
    }
    if !transfer.token_name.is_ascii() {
        score += 20;
    }
    if LEGITIMATE_BASE_COLLECTIONS.contains(&transfer.contract_address.as_str()) {
        score = score.saturating_sub(30);
    }
    score
}

/// Count distinct collections with a positive score.
pub fn assess(address_lower: &str, transfers: &[TokenTransfer]) -> RiskSignal {
    let mut seen = HashSet::new();
    let mut suspicious = 0u64;
    for transfer in transfers {
        if !seen.insert(transfer.contract_address.as_str()) {
            continue;
        }
        if nft_risk_score(address_lower, transfer) > 0 {
            suspicious += 1;
        }
    }
    RiskSignal {
        count: suspicious,
        weighted_score: (suspicious as f64 * WEIGHT_PER_NFT).min(1.0),
    }
}
