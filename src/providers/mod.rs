// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External chain-data collaborators.
//!
//! The collectors never talk HTTP directly. They depend on the traits below,
//! which have reqwest-backed implementations for the explorer
//! ([`explorer::ExplorerClient`]) and the portfolio API
//! ([`portfolio::PortfolioClient`]). Tests substitute in-memory fakes.
//!
//! Explorer envelopes with a non-success `status` are treated as "no data"
//! and surface as an empty list, never as an error.

pub mod explorer;
pub mod names;
pub mod portfolio;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::retry::{with_backoff, RetryPolicy, Transient};

pub use explorer::ExplorerClient;
pub use names::{CachedNameResolver, NameResolver, NoNameResolver};
pub use portfolio::PortfolioClient;

/// Failure talking to a third-party data API.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl Transient for ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status(status) => *status == 429 || *status >= 500,
            Self::Timeout | Self::Network(_) => true,
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() || err.is_body() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A normal (external) transaction as reported by the explorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorerTx {
    pub hash: String,
    /// Lowercase `0x` address.
    pub from: String,
    /// Lowercase `0x` address, empty for contract creation.
    pub to: String,
    pub value: U256,
    pub gas_used: u64,
    pub timestamp: u64,
    /// Raw calldata including the `0x` prefix.
    pub input: String,
}

/// An ERC-20 or NFT transfer as reported by the explorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTransfer {
    /// Lowercase contract address.
    pub contract_address: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Empty for fungible transfers.
    pub token_id: String,
    /// Raw decimal string as returned by the API.
    pub value: String,
    pub from: String,
    pub to: String,
}

/// Transaction and transfer history for an address.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// One page (1-based) of normal transactions.
    async fn transactions(
        &self,
        address: Address,
        page: u32,
        offset: u32,
        order: SortOrder,
    ) -> Result<Vec<ExplorerTx>, ProviderError>;

    /// ERC-20 transfers touching the address, newest first.
    async fn token_transfers(&self, address: Address) -> Result<Vec<TokenTransfer>, ProviderError>;

    /// ERC-721/1155 transfers touching the address, newest first.
    async fn nft_transfers(&self, address: Address) -> Result<Vec<TokenTransfer>, ProviderError>;
}

/// Portfolio valuation for an address, in USD.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn current_balance(&self, address: Address) -> Result<f64, ProviderError>;

    /// Mean of the non-zero points of the last-month balance chart.
    async fn past_month_average(&self, address: Address) -> Result<f64, ProviderError>;
}

/// Page size used when walking the full transaction history.
pub const FULL_HISTORY_PAGE_SIZE: u32 = 10_000;

/// Walk every page of the transaction history in ascending order.
///
/// Stops on an empty or short page. Each page is retried independently.
pub async fn all_transactions(
    provider: &dyn ChainDataProvider,
    address: Address,
    retry: RetryPolicy,
) -> Result<Vec<ExplorerTx>, ProviderError> {
    let mut txs = Vec::new();
    let mut page = 1;
    loop {
        let batch = with_backoff("explorer.txlist", retry, || {
            provider.transactions(address, page, FULL_HISTORY_PAGE_SIZE, SortOrder::Asc)
        })
        .await?;
        let len = batch.len();
        txs.extend(batch);
        if len < FULL_HISTORY_PAGE_SIZE as usize {
            return Ok(txs);
        }
        page += 1;
    }
}

/// The most recent `limit` transactions, fetched in pages of `page_size`.
///
/// A failing page after the first one ends the walk with what was gathered.
pub async fn recent_transactions(
    provider: &dyn ChainDataProvider,
    address: Address,
    page_size: u32,
    limit: usize,
    retry: RetryPolicy,
) -> Result<Vec<ExplorerTx>, ProviderError> {
    let mut txs: Vec<ExplorerTx> = Vec::new();
    let mut page = 1;
    while txs.len() < limit {
        let result = with_backoff("explorer.txlist.recent", retry, || {
            provider.transactions(address, page, page_size, SortOrder::Desc)
        })
        .await;
        let batch = match result {
            Ok(batch) => batch,
            Err(err) if page == 1 => return Err(err),
            Err(err) => {
                tracing::warn!(page, error = %err, "stopping recent transaction walk early");
                break;
            }
        };
        let len = batch.len();
        txs.extend(batch);
        if len < page_size as usize {
            break;
        }
        page += 1;
    }
    txs.truncate(limit);
    Ok(txs)
}


#[cfg(test)]
mod tests {
    use super::testing::FakeChainData;
    use super::*;

    fn tx(ts: u64) -> ExplorerTx {
        ExplorerTx {
            timestamp: ts,
            ..Default::default()
        }
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Status(429).is_transient());
        assert!(ProviderError::Status(503).is_transient());
        assert!(ProviderError::Timeout.is_transient());
        assert!(!ProviderError::Status(404).is_transient());
        assert!(!ProviderError::Decode("bad".into()).is_transient());
    }

    #[tokio::test]
    async fn all_transactions_returns_everything() {
        let provider = FakeChainData::with_txs((0..25).map(tx).collect());
        let txs = all_transactions(&provider, Address::ZERO, RetryPolicy::immediate(1))
            .await
            .unwrap();
        assert_eq!(txs.len(), 25);
        assert_eq!(txs[0].timestamp, 0);
    }

    #[tokio::test]
    async fn recent_transactions_caps_and_orders_newest_first() {
        let provider = FakeChainData::with_txs((0..25).map(tx).collect());
        let txs = recent_transactions(&provider, Address::ZERO, 10, 15, RetryPolicy::immediate(1))
            .await
            .unwrap();
        assert_eq!(txs.len(), 15);
        assert_eq!(txs[0].timestamp, 24);
    }

    #[tokio::test]
    async fn first_page_failure_propagates() {
        let provider = FakeChainData::with_txs(vec![tx(1)]);
        provider
            .failures
            .lock()
            .unwrap()
            .push(ProviderError::Status(400));
        let result = all_transactions(&provider, Address::ZERO, RetryPolicy::immediate(3)).await;
        assert!(matches!(result, Err(ProviderError::Status(400))));
    }

    #[tokio::test]
    async fn transient_page_failure_is_retried() {
        let provider = FakeChainData::with_txs(vec![tx(1), tx(2)]);
        provider
            .failures
            .lock()
            .unwrap()
            .push(ProviderError::Status(429));
        let txs = all_transactions(&provider, Address::ZERO, RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert_eq!(txs.len(), 2);
    }
}
