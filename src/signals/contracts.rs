// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Risky contract interactions, judged from the wallet's own recent history.

use std::collections::BTreeSet;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::debug;

use super::{
    has_suspicious_address_pattern, CollectorError, CollectorOutput, RiskSignal, SignalCollector,
    SignalKind,
};
use crate::address::address_key;
use crate::providers::{recent_transactions, ChainDataProvider, ExplorerTx};
use crate::ratelimit::SharedClock;
use crate::retry::RetryPolicy;

const PAGE_SIZE: u32 = 500;
const MAX_TRANSACTIONS: usize = 1_000;
const RISKY_THRESHOLD: u32 = 20;
const ONE_ETH_WEI: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRiskLevel {
    Low,
    Mid,
    High,
}

impl ContractRiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= 50 {
            Self::High
        } else if score >= 30 {
            Self::Mid
        } else {
            Self::Low
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Mid => 0.08,
            Self::High => 1.0,
        }
    }
}

pub struct ContractRiskCollector {
    chain: Arc<dyn ChainDataProvider>,
    clock: SharedClock,
    retry: RetryPolicy,
}

impl ContractRiskCollector {
    pub fn new(chain: Arc<dyn ChainDataProvider>, clock: SharedClock, retry: RetryPolicy) -> Self {
        Self { chain, clock, retry }
    }
}

#[async_trait]
impl SignalCollector for ContractRiskCollector {
    fn kind(&self) -> SignalKind {
        SignalKind::Contracts
    }

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError> {
        let txs = recent_transactions(
            self.chain.as_ref(),
            address,
            PAGE_SIZE,
            MAX_TRANSACTIONS,
            self.retry,
        )
        .await?;
        let signal = assess(&address_key(&address), &txs, self.clock.now_secs());
        debug!(
            %address,
            risky = signal.count,
            weight = signal.weighted_score,
            "contract risk assessed"
        );
        Ok(CollectorOutput::Risk(signal))
    }
}

/// Distinct contracts the wallet called (non-empty calldata, not itself).
pub fn interacted_contracts(address_lower: &str, txs: &[ExplorerTx]) -> BTreeSet<String> {
    txs.iter()
        .filter(|tx| {
            let to = tx.to.trim();
            !to.is_empty() && to != "0x" && to != address_lower && tx.input != "0x"
        })
        .map(|tx| tx.to.trim().to_string())
        .collect()
}

/// Risk score for one contract, capped at 100.
pub fn contract_risk_score(contract: &str, txs: &[ExplorerTx], now_secs: u64) -> u32 {
    let calls: Vec<&ExplorerTx> = txs.iter().filter(|tx| tx.to == contract).collect();
    if calls.is_empty() {
        return if has_suspicious_address_pattern(contract) { 15 } else { 0 };
    }
    let n = calls.len() as f64;
    let mut score = 0;

    if calls.len() == 1 {
        score += 15;
    }
    let avg_gas = calls.iter().map(|tx| tx.gas_used as f64).sum::<f64>() / n;
    if avg_gas > 500_000.0 {
        score += 10;
    }
    let max_value = calls.iter().map(|tx| tx.value).max().unwrap_or(U256::ZERO);
    if max_value > U256::from(ONE_ETH_WEI) {
        score += 5;
    }
    let latest = calls.iter().map(|tx| tx.timestamp).max().unwrap_or(0);
    if now_secs.saturating_sub(latest) < 86_400 {
        score += 8;
    }
    let avg_input = calls.iter().map(|tx| tx.input.len() as f64).sum::<f64>() / n;
    if avg_input < 10.0 {
        score += 12;
    }
    if has_suspicious_address_pattern(contract) {
        score += 15;
    }
    score.min(100)
}

pub fn assess(address_lower: &str, txs: &[ExplorerTx], now_secs: u64) -> RiskSignal {
    let mut count = 0u64;
    let mut weighted = 0.0;
    for contract in interacted_contracts(address_lower, txs) {
        let score = contract_risk_score(&contract, txs, now_secs);
        if score >= RISKY_THRESHOLD {
            count += 1;
            weighted += ContractRiskLevel::from_score(score).weight();
        }
    }
    RiskSignal {
        count,
        weighted_score: (weighted * 100.0).round() / 100.0,
    }
}
