// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Risky ERC-20 tokens held or received by the wallet.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::debug;

use super::{first_match, CollectorError, CollectorOutput, RiskSignal, SignalCollector, SignalKind};
use crate::providers::{ChainDataProvider, TokenTransfer};
use crate::retry::{with_backoff, RetryPolicy};

const KNOWN_SCAM_TOKENS: &[&str] = &["0x1234567890123456789012345678901234567890"];

const HIGH_RISK_PATTERNS: &[&str] = &["honeypot", "scam", "fake", "rug", "suspicious"];

const MEME_PATTERNS: &[&str] = &[
    "moon", "inu", "elon", "doge", "shib", "pepe", "meme", "rocket", "safe", "baby", "mini",
];

const LURE_PATTERNS: &[&str] = &[
    "claim", "airdrop", "reward", "swap", "visit", "free", "gift", "bonus", "earn", "profit",
];

/// Deduction per risky token and its cap.
const WEIGHT_PER_TOKEN: f64 = 0.005;
const MAX_WEIGHT: f64 = 3.0;

pub struct TokenRiskCollector {
    chain: Arc<dyn ChainDataProvider>,
    retry: RetryPolicy,
}

impl TokenRiskCollector {
    pub fn new(chain: Arc<dyn ChainDataProvider>, retry: RetryPolicy) -> Self {
        Self { chain, retry }
    }
}

#[async_trait]
impl SignalCollector for TokenRiskCollector {
    fn kind(&self) -> SignalKind {
        SignalKind::Tokens
    }

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError> {
        let transfers = with_backoff("explorer.tokentx", self.retry, || {
            self.chain.token_transfers(address)
        })
        .await?;
        let signal = assess(&transfers);
        debug!(%address, risky = signal.count, checked = transfers.len(), "token risk assessed");
        Ok(CollectorOutput::Risk(signal))
    }
}

/// Score one token contract from its first observed transfer.
pub fn token_risk_score(transfer: &TokenTransfer) -> u32 {
    let name = transfer.token_name.to_lowercase();
    let symbol = transfer.token_symbol.to_lowercase();
    let mut score = 0;

    if KNOWN_SCAM_TOKENS.contains(&transfer.contract_address.as_str()) {
        score += 40;
    }
    if first_match(HIGH_RISK_PATTERNS, &name, &symbol).is_some() {
        score += 30;
    }
    if first_match(MEME_PATTERNS, &name, &symbol).is_some() {
        score += 15;
    }
    if first_match(LURE_PATTERNS, &name, &symbol).is_some() {
        score += 20;
    }
    if symbol.chars().count() > 15 {
        score += 10;
    }
    if transfer.value == "0" {
        score += 15;
    } else if transfer
        .value
        .parse::<u128>()
        .map(|v| v < 1_000_000)
        .unwrap_or(false)
    {
        score += 10;
    }
    score
}

/// Count distinct risky token contracts across the transfer list.
pub fn assess(transfers: &[TokenTransfer]) -> RiskSignal {
    let mut seen = HashSet::new();
    let mut risky = 0u64;
    for transfer in transfers {
        if !seen.insert(transfer.contract_address.as_str()) {
            continue;
        }
        if token_risk_score(transfer) > 0 {
            risky += 1;
        }
    }
    RiskSignal {
        count: risky,
        weighted_score: (risky as f64 * WEIGHT_PER_TOKEN).min(MAX_WEIGHT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::FakeChainData;
    use crate::providers::ProviderError;

    fn transfer(contract: &str, name: &str, symbol: &str, value: &str) -> TokenTransfer {
        TokenTransfer {
            contract_address: contract.to_string(),
            token_name: name.to_string(),
            token_symbol: symbol.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn clean_token_scores_zero() {
        let usdc = transfer("0xusdc", "USD Coin", "USDC", "5000000");
        assert_eq!(token_risk_score(&usdc), 0);
    }

    #[test]
    fn patterns_add_once_per_category() {
        // "scam" and "fake" are both high-risk but count once.
        let t = transfer("0xa", "Fake Scam Moon Airdrop", "FSMA", "5000000");
        assert_eq!(token_risk_score(&t), 30 + 15 + 20);
    }

    #[test]
    fn value_heuristics() {
        assert_eq!(token_risk_score(&transfer("0xa", "x", "x", "0")), 15);
        assert_eq!(token_risk_score(&transfer("0xa", "x", "x", "999999")), 10);
        assert_eq!(token_risk_score(&transfer("0xa", "x", "x", "1000000")), 0);
        assert_eq!(
            token_risk_score(&transfer("0xa", "x", "ABCDEFGHIJKLMNOP", "1000000")),
            10
        );
    }

    #[test]
    fn counts_unique_contracts_only() {
        let transfers = vec![
            transfer("0xa", "Moon Token", "MOON", "5000000"),
            transfer("0xa", "Moon Token", "MOON", "5000000"),
            transfer("0xb", "USD Coin", "USDC", "5000000"),
            transfer("0xc", "Claim rewards", "CLAIM", "0"),
        ];
        let signal = assess(&transfers);
        assert_eq!(signal.count, 2);
        assert!((signal.weighted_score - 0.01).abs() < 1e-12);
    }

    #[test]
    fn weight_is_capped() {
        let transfers: Vec<_> = (0..1000)
            .map(|i| transfer(&format!("0x{i}"), "x", "x", "0"))
            .collect();
        let signal = assess(&transfers);
        assert_eq!(signal.count, 1000);
        assert_eq!(signal.weighted_score, 3.0);
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let chain = FakeChainData::default();
        chain.failures.lock().unwrap().push(ProviderError::Status(400));
        let collector = TokenRiskCollector::new(Arc::new(chain), RetryPolicy::immediate(1));
        assert!(collector.collect(Address::ZERO).await.is_err());
    }
}
