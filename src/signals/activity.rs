// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Base activity: transaction count, gas, balances, streaks, wallet age and name.

use std::collections::BTreeSet;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::warn;

use super::{ActivitySnapshot, CollectorError, CollectorOutput, SignalCollector, SignalKind};
use crate::address::address_key;
use crate::providers::{
    all_transactions, BalanceSource, ChainDataProvider, ExplorerTx, NameResolver,
};
use crate::ratelimit::SharedClock;
use crate::retry::{with_backoff, RetryPolicy};

const SECS_PER_DAY: u64 = 86_400;

pub struct ActivityCollector {
    chain: Arc<dyn ChainDataProvider>,
    balances: Arc<dyn BalanceSource>,
    names: Arc<dyn NameResolver>,
    clock: SharedClock,
    retry: RetryPolicy,
}

impl ActivityCollector {
    pub fn new(
        chain: Arc<dyn ChainDataProvider>,
        balances: Arc<dyn BalanceSource>,
        names: Arc<dyn NameResolver>,
        clock: SharedClock,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            chain,
            balances,
            names,
            clock,
            retry,
        }
    }
}

#[async_trait]
impl SignalCollector for ActivityCollector {
    fn kind(&self) -> SignalKind {
        SignalKind::Activity
    }

    async fn collect(&self, address: Address) -> Result<CollectorOutput, CollectorError> {
        let txs = all_transactions(self.chain.as_ref(), address, self.retry).await?;

        let current_balance = with_backoff("portfolio.current", self.retry, || {
            self.balances.current_balance(address)
        })
        .await
        .unwrap_or_else(|err| {
            warn!(%address, error = %err, "current balance unavailable, using 0");
            0.0
        });
        let past_balance = with_backoff("portfolio.chart", self.retry, || {
            self.balances.past_month_average(address)
        })
        .await
        .unwrap_or_else(|err| {
            warn!(%address, error = %err, "past balance unavailable, using 0");
            0.0
        });
        let name = self.names.reverse_name(address).await.unwrap_or_else(|err| {
            warn!(%address, error = %err, "reverse name lookup failed");
            None
        });

        let now = self.clock.now_secs();
        Ok(CollectorOutput::Activity(snapshot(
            &address_key(&address),
            &txs,
            current_balance,
            past_balance,
            name,
            now,
        )))
    }
}

/// Build the snapshot from already-fetched data.
pub fn snapshot(
    address_lower: &str,
    txs: &[ExplorerTx],
    current_balance: f64,
    past_balance: f64,
    name: Option<String>,
    now_secs: u64,
) -> ActivitySnapshot {
    let days: BTreeSet<u64> = txs.iter().map(|tx| tx.timestamp / SECS_PER_DAY).collect();
    let today = now_secs / SECS_PER_DAY;
    let (current_streak, max_streak) = streaks(&days, today);

    ActivitySnapshot {
        tx_count: txs.len() as u64,
        gas_used: gas_used_by(address_lower, txs),
        current_balance: round_to(current_balance, 4),
        past_balance: round_to(past_balance, 2),
        current_streak,
        max_streak,
        age_days: days
            .first()
            .map(|first| today.saturating_sub(*first) as u32)
            .unwrap_or(0),
        name,
    }
}

/// Sum of `gasUsed` over transactions sent by the address.
pub fn gas_used_by(address_lower: &str, txs: &[ExplorerTx]) -> u64 {
    txs.iter()
        .filter(|tx| tx.from == address_lower)
        .fold(0u64, |acc, tx| acc.saturating_add(tx.gas_used))
}

/// `(current, max)` runs of consecutive active days.
///
/// The current streak counts back from `today`; a wallet that was not active
/// today has a current streak of 0.
pub fn streaks(days: &BTreeSet<u64>, today: u64) -> (u32, u32) {
    if days.is_empty() {
        return (0, 0);
    }
    let mut max_run = 1u32;
    let mut run = 1u32;
    let mut prev: Option<u64> = None;
    for day in days {
        if let Some(p) = prev {
            run = if *day == p + 1 { run + 1 } else { 1 };
            max_run = max_run.max(run);
        }
        prev = Some(*day);
    }

    let mut current = 0u32;
    let mut day = today;
    while days.contains(&day) {
        current += 1;
        match day.checked_sub(1) {
            Some(d) => day = d,
            None => break,
        }
    }
    (current, max_run)
}

/// A Basename counts toward the score only when it is a live `.base.eth` name.
pub fn is_verified_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with("⛔️") && name.to_lowercase().ends_with(".base.eth")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
