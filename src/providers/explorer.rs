// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-compatible explorer client.
//!
//! Normal transactions come from a Blockscout endpoint (no key required),
//! token and NFT transfers from the Etherscan v2 multichain endpoint.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ChainDataProvider, ExplorerTx, ProviderError, SortOrder, TokenTransfer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `{"status": "1", "message": "OK", "result": [...]}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTx {
    hash: Option<String>,
    from: Option<String>,
    to: Option<String>,
    value: Option<String>,
    gas_used: Option<String>,
    time_stamp: Option<String>,
    input: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTransfer {
    contract_address: Option<String>,
    token_name: Option<String>,
    token_symbol: Option<String>,
    #[serde(rename = "tokenID")]
    token_id: Option<String>,
    value: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl From<RawTx> for ExplorerTx {
    fn from(raw: RawTx) -> Self {
        Self {
            hash: raw.hash.unwrap_or_default(),
            from: lower(raw.from),
            to: lower(raw.to),
            value: raw
                .value
                .and_then(|v| U256::from_str(&v).ok())
                .unwrap_or_default(),
            gas_used: parse_num(raw.gas_used),
            timestamp: parse_num(raw.time_stamp),
            input: raw
                .input
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| "0x".to_string()),
        }
    }
}

impl From<RawTransfer> for TokenTransfer {
    fn from(raw: RawTransfer) -> Self {
        Self {
            contract_address: lower(raw.contract_address),
            token_name: raw.token_name.unwrap_or_default(),
            token_symbol: raw.token_symbol.unwrap_or_default(),
            token_id: raw.token_id.unwrap_or_default(),
            value: raw
                .value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "0".to_string()),
            from: lower(raw.from),
            to: lower(raw.to),
        }
    }
}

fn lower(field: Option<String>) -> String {
    field.map(|s| s.to_lowercase()).unwrap_or_default()
}

fn parse_num(field: Option<String>) -> u64 {
    field.and_then(|s| s.parse().ok()).unwrap_or_default()
}

/// Decode an explorer envelope. A non-success status means "no data".
fn decode_list<T, R>(action: &str, envelope: Envelope) -> Result<Vec<T>, ProviderError>
where
    R: for<'de> Deserialize<'de>,
    T: From<R>,
{
    if envelope.status != "1" {
        debug!(action, message = %envelope.message, "explorer returned no data");
        return Ok(Vec::new());
    }
    let raw: Vec<R> = serde_json::from_value(envelope.result)
        .map_err(|e| ProviderError::Decode(format!("{action}: {e}")))?;
    Ok(raw.into_iter().map(T::from).collect())
}

pub struct ExplorerClient {
    http: reqwest::Client,
    txlist_url: String,
    token_url: String,
    api_key: String,
    chain_id: u64,
}

impl ExplorerClient {
    pub fn new(
        txlist_url: impl Into<String>,
        token_url: impl Into<String>,
        api_key: impl Into<String>,
        chain_id: u64,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("BaseBadge/1.0")
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http,
            txlist_url: txlist_url.into(),
            token_url: token_url.into(),
            api_key: api_key.into(),
            chain_id,
        })
    }

    async fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Envelope, ProviderError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.json::<Envelope>().await?)
    }

    async fn transfers(
        &self,
        action: &'static str,
        address: Address,
    ) -> Result<Vec<TokenTransfer>, ProviderError> {
        let query = [
            ("chainid", self.chain_id.to_string()),
            ("module", "account".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
            ("startblock", "0".to_string()),
            ("endblock", "99999999".to_string()),
            ("sort", SortOrder::Desc.as_str().to_string()),
            ("apikey", self.api_key.clone()),
        ];
        let envelope = self.fetch(&self.token_url, &query).await?;
        decode_list::<TokenTransfer, RawTransfer>(action, envelope)
    }
}

#[async_trait]
impl ChainDataProvider for ExplorerClient {
    async fn transactions(
        &self,
        address: Address,
        page: u32,
        offset: u32,
        order: SortOrder,
    ) -> Result<Vec<ExplorerTx>, ProviderError> {
        let query = [
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", address.to_string()),
            ("startblock", "0".to_string()),
            ("endblock", "99999999".to_string()),
            ("page", page.to_string()),
            ("offset", offset.to_string()),
            ("sort", order.as_str().to_string()),
        ];
        let envelope = self.fetch(&self.txlist_url, &query).await?;
        decode_list::<ExplorerTx, RawTx>("txlist", envelope)
    }

    async fn token_transfers(&self, address: Address) -> Result<Vec<TokenTransfer>, ProviderError> {
        self.transfers("tokentx", address).await
    }

    async fn nft_transfers(&self, address: Address) -> Result<Vec<TokenTransfer>, ProviderError> {
        self.transfers("tokennfttx", address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn non_success_status_is_empty() {
        let env = envelope(json!({
            "status": "0",
            "message": "No transactions found",
            "result": []
        }));
        let txs = decode_list::<ExplorerTx, RawTx>("txlist", env).unwrap();
        assert!(txs.is_empty());

        // Rate-limit notices arrive as a string result with status 0.
        let env = envelope(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }));
        let txs = decode_list::<ExplorerTx, RawTx>("txlist", env).unwrap();
        assert!(txs.is_empty());
    }

    #[test]
    fn decodes_transactions() {
        let env = envelope(json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "hash": "0xabc",
                "from": "0xAAAAaaaaAAAAaaaaAAAAaaaaAAAAaaaaAAAAaaaa",
                "to": "0xBbbbBBBBbbbbBBBBbbbbBBBBbbbbBBBBbbbbBBBB",
                "value": "2000000000000000000",
                "gasUsed": "21000",
                "timeStamp": "1700000000",
                "input": "0x"
            }]
        }));
        let txs = decode_list::<ExplorerTx, RawTx>("txlist", env).unwrap();
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.from, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(tx.gas_used, 21_000);
        assert_eq!(tx.timestamp, 1_700_000_000);
        assert_eq!(tx.value, U256::from(2_000_000_000_000_000_000u128));
    }

    #[test]
    fn decodes_nft_transfers() {
        let env = envelope(json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "contractAddress": "0x4ED4E862860BED51A9570B96D89AF5E1B0EFEFED",
                "tokenName": "Degen",
                "tokenSymbol": "DEGEN",
                "tokenID": "42",
                "from": "0x0000000000000000000000000000000000000000",
                "to": "0x1111111111111111111111111111111111111111"
            }]
        }));
        let transfers = decode_list::<TokenTransfer, RawTransfer>("tokennfttx", env).unwrap();
        assert_eq!(transfers[0].contract_address, "0x4ed4e862860bed51a9570b96d89af5e1b0efefed");
        assert_eq!(transfers[0].token_id, "42");
        assert_eq!(transfers[0].value, "0");
    }

    #[test]
    fn malformed_result_is_decode_error() {
        let env = envelope(json!({
            "status": "1",
            "message": "OK",
            "result": "not a list"
        }));
        let err = decode_list::<ExplorerTx, RawTx>("txlist", env).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
