// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Risky approvals and signatures sent by the wallet.
//!
//! Outgoing transactions are matched on their 4-byte selector. Calldata is
//! decoded just far enough to find the spender and the approved amount.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::debug;

use super::{
    has_suspicious_address_pattern, CollectorError, CollectorOutput, RiskSignal, SignalCollector,
    SignalKind,
};
use crate::address::address_key;
use crate::providers::{all_transactions, ChainDataProvider, ExplorerTx};
use crate::retry::RetryPolicy;

pub const APPROVE: &str = "0x095ea7b3";
pub const PERMIT: &str = "0xd505accf";
pub const SET_APPROVAL_FOR_ALL: &str = "0xa22cb465";
pub const MULTICALL: &str = "0xac9650d8";
pub const EXECUTE: &str = "0x1cff79cd";
pub const MINT: &str = "0x40c10f19";

const KNOWN_SAFE_SPENDERS: &[&str] = &[
    "0x4200000000000000000000000000000000000006", // WETH9
    "0x198ef79f1f515f02dfe9e3115ed9fc07183f02fc", // Uniswap Universal Router
    "0x2626664c2603336e57b271c5c0b26f421741e481", // Uniswap SwapRouter
    "0x827922686190790b37229fd06084350e74485b72", // Aerodrome Router
    "0x1111111254eeb25477b68fb85ed929f73a960582", // 1inch Router
    "0xbbbbbbbbbb9cc5e90e3b3af64bdaf62c37eeffcb", // Morpho Blue
    "0x00000000000001ad428e4906ae43d8f9852d0dd6", // Seaport
    "0x7c74dfe39976dc395529c14e54a597809980e01c", // Zora
    "0x3154cf16ccdb4c6d922629664174b904d80f2c35", // Base L1 bridge
    "0x8731d54e9d02c286767d56ac03e8037c07e01e98", // Stargate
    "0x66a71dcef29a0ffbdbe3c6a460a3b5bc225cd675", // LayerZero
    "0xca11bde05977b3631167028862be2a173976ca11", // Multicall3
    "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913", // USDC
    "0x50c5725949a6f0c72e6c4a641f24049a917db0cb", // DAI
    "0x2ae3f1ec7f1f5012cfeab0185bfc7aa3cf0dec22", // cbETH
];

const MIN_KEPT_SCORE: u32 = 15;
const MAX_WEIGHT: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskFactor {
    UnlimitedApproval,
    SuspiciousSpender,
    NftApprovalForAll,
    SuspiciousNftOperator,
    GaslessApproval,
    UnlimitedGaslessApproval,
    BatchOperation,
    MultipleApprovalsInBatch,
}

impl RiskFactor {
    fn multiplier(&self) -> f64 {
        match self {
            Self::UnlimitedApproval | Self::UnlimitedGaslessApproval => 1.5,
            Self::SuspiciousSpender | Self::SuspiciousNftOperator => 1.3,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignRiskLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl SignRiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => Self::High,
            40..=69 => Self::Medium,
            20..=39 => Self::Low,
            _ => Self::Minimal,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Minimal => 0.8,
            Self::Low => 0.9,
            Self::Medium => 1.0,
            Self::High => 1.2,
        }
    }
}

/// Decoded view of one risky-looking call.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureAnalysis {
    pub selector: &'static str,
    /// Lowercase spender/operator, when the calldata carries one.
    pub spender: Option<String>,
    pub factors: BTreeSet<RiskFactor>,
}

pub struct ApprovalRiskCollector {
    chain: Arc<dyn ChainDataProvider>,
    retry: RetryPolicy,
}

impl ApprovalRiskCollector {
    pub fn new(chain: Arc<dyn ChainDataProvider>, retry: RetryPolicy) -> Self {
        Self { chain, retry }
    }
}

#[async_trait]
impl SignalCollector for ApprovalRiskCollector {
    fn kind(&self) -> SignalKind {
        SignalKind::Approvals
    }

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError> {
        let txs = all_transactions(self.chain.as_ref(), address, self.retry).await?;
        let signal = assess(&address_key(&address), &txs);
        debug!(
            %address,
            patterns = signal.count,
            weight = signal.weighted_score,
            "approval risk assessed"
        );
        Ok(CollectorOutput::Risk(signal))
    }
}

fn known_selector(selector: &str) -> Option<&'static str> {
    [APPROVE, PERMIT, SET_APPROVAL_FOR_ALL, MULTICALL, EXECUTE, MINT]
        .into_iter()
        .find(|s| *s == selector)
}

/// 32-byte ABI word `index` (0-based, after the selector) as hex.
fn word(input: &str, index: usize) -> Option<&str> {
    let start = 10 + index * 64;
    input.get(start..start + 64)
}

fn word_address(input: &str, index: usize) -> Option<String> {
    let tail = word(input, index)?.get(24..)?;
    Some(format!("0x{}", tail.to_lowercase()))
}

fn word_u256(input: &str, index: usize) -> Option<U256> {
    word(input, index).and_then(|w| U256::from_str_radix(w, 16).ok())
}

/// At or above 99% of `uint256.max` counts as unlimited.
pub fn is_unlimited(amount: U256) -> bool {
    amount >= U256::MAX - U256::MAX / U256::from(100u8)
}

pub fn analyze(input: &str) -> Option<SignatureAnalysis> {
    let selector = known_selector(&input.get(..10)?.to_lowercase())?;
    let mut factors = BTreeSet::new();
    let mut spender = None;

    match selector {
        APPROVE => {
            // approve(address spender, uint256 amount)
            spender = word_address(input, 0);
            if word_u256(input, 1).is_some_and(is_unlimited) {
                factors.insert(RiskFactor::UnlimitedApproval);
            }
            if spender.as_deref().is_some_and(has_suspicious_address_pattern) {
                factors.insert(RiskFactor::SuspiciousSpender);
            }
        }
        SET_APPROVAL_FOR_ALL => {
            // setApprovalForAll(address operator, bool approved)
            spender = word_address(input, 0);
            if word_u256(input, 1) == Some(U256::from(1u8)) {
                factors.insert(RiskFactor::NftApprovalForAll);
                if spender.as_deref().is_some_and(has_suspicious_address_pattern) {
                    factors.insert(RiskFactor::SuspiciousNftOperator);
                }
            }
        }
        PERMIT => {
            // permit(address owner, address spender, uint256 value, ...)
            factors.insert(RiskFactor::GaslessApproval);
            spender = word_address(input, 1);
            if word_u256(input, 2).is_some_and(is_unlimited) {
                factors.insert(RiskFactor::UnlimitedGaslessApproval);
            }
        }
        MULTICALL => {
            factors.insert(RiskFactor::BatchOperation);
            let body = input.get(10..).unwrap_or_default().to_lowercase();
            if body.matches(&APPROVE[2..]).count() > 1 {
                factors.insert(RiskFactor::MultipleApprovalsInBatch);
            }
        }
        _ => {}
    }

    Some(SignatureAnalysis {
        selector,
        spender,
        factors,
    })
}

/// Risk score for an analysed call, capped at 100.
pub fn sign_risk_score(analysis: &SignatureAnalysis) -> u32 {
    let base = match analysis.selector {
        APPROVE => 25.0,
        PERMIT => 35.0,
        SET_APPROVAL_FOR_ALL => 30.0,
        MULTICALL => 20.0,
        EXECUTE => 15.0,
        MINT => 20.0,
        _ => 10.0,
    };
    let mut score: f64 = analysis
        .factors
        .iter()
        .fold(base, |acc, factor| acc * factor.multiplier());
    if analysis
        .spender
        .as_deref()
        .is_some_and(|s| KNOWN_SAFE_SPENDERS.contains(&s))
    {
        score *= 0.6;
    }
    (score as u32).min(100)
}

/// Group risky calls by `(selector, spender)` and weigh each group by level.
pub fn assess(address_lower: &str, txs: &[ExplorerTx]) -> RiskSignal {
    // Level of the first call seen in each group.
    let mut groups: HashMap<(&'static str, String), SignRiskLevel> = HashMap::new();
    for tx in txs.iter().filter(|tx| tx.from == address_lower) {
        let Some(analysis) = analyze(&tx.input) else {
            continue;
        };
        let score = sign_risk_score(&analysis);
        if score < MIN_KEPT_SCORE {
            continue;
        }
        let key = (
            analysis.selector,
            analysis.spender.unwrap_or_else(|| "unknown".to_string()),
        );
        groups
            .entry(key)
            .or_insert_with(|| SignRiskLevel::from_score(score));
    }

    let total: f64 = groups.values().map(SignRiskLevel::weight).sum();
    let weighted = if total > 0.0 {
        (total.powf(0.6) * 1.5).min(MAX_WEIGHT)
    } else {
        0.0
    };
    RiskSignal {
        count: groups.len() as u64,
        weighted_score: (weighted * 100.0).round() / 100.0,
    }
}
