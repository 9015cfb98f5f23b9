// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Zerion-style portfolio API client (Base chain USD valuations).

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use serde_json::Value;

use super::{BalanceSource, ProviderError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: String,
    /// `Basic base64(key + ":")`, or empty when no key is configured.
    authorization: String,
}

impl PortfolioClient {
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("BaseBadge/1.0")
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let authorization = if api_key.is_empty() {
            String::new()
        } else {
            format!("Basic {}", Base64::encode_string(format!("{api_key}:").as_bytes()))
        };
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let mut request = self
            .http
            .get(format!("{}{path}", self.base_url))
            .header("accept", "application/json")
            .query(query);
        if !self.authorization.is_empty() {
            request = request.header("authorization", &self.authorization);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl BalanceSource for PortfolioClient {
    async fn current_balance(&self, address: Address) -> Result<f64, ProviderError> {
        let body = self
            .get(&format!("/wallets/{address}/portfolio"), &[])
            .await?;
        base_chain_value(&body)
    }

    async fn past_month_average(&self, address: Address) -> Result<f64, ProviderError> {
        let body = self
            .get(
                &format!("/wallets/{address}/charts/month"),
                &[("currency", "usd"), ("filter[chain_ids]", "base")],
            )
            .await?;
        chart_average(&body)
    }
}

/// `data.attributes.positions_distribution_by_chain.base`
fn base_chain_value(body: &Value) -> Result<f64, ProviderError> {
    body.pointer("/data/attributes/positions_distribution_by_chain/base")
        .and_then(Value::as_f64)
        .ok_or_else(|| ProviderError::Decode("portfolio: missing base distribution".into()))
}

/// Mean of the non-zero `[timestamp, value]` points in `data.attributes.points`.
fn chart_average(body: &Value) -> Result<f64, ProviderError> {
    let points = body
        .pointer("/data/attributes/points")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Decode("chart: missing points".into()))?;
    let values: Vec<f64> = points
        .iter()
        .filter_map(|p| p.get(1).and_then(Value::as_f64))
        .filter(|v| *v != 0.0)
        .collect();
    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_base_distribution() {
        let body = json!({
            "data": {
                "attributes": {
                    "positions_distribution_by_chain": {"base": 12.5, "ethereum": 3.0}
                }
            }
        });
        assert_eq!(base_chain_value(&body).unwrap(), 12.5);
    }

    #[test]
    fn missing_base_entry_is_decode_error() {
        let body = json!({"data": {"attributes": {"positions_distribution_by_chain": {}}}});
        assert!(matches!(base_chain_value(&body), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn chart_average_skips_zero_points() {
        let body = json!({
            "data": {"attributes": {"points": [[1, 0.0], [2, 4.0], [3, 8.0], [4, null]]}}
        });
        assert_eq!(chart_average(&body).unwrap(), 6.0);
    }

    #[test]
    fn empty_chart_averages_to_zero() {
        let body = json!({"data": {"attributes": {"points": []}}});
        assert_eq!(chart_average(&body).unwrap(), 0.0);
    }

    #[test]
    fn authorization_header_is_basic() {
        let client = PortfolioClient::new("https://api.zerion.io/v1/", "zk_test").unwrap();
        assert_eq!(client.authorization, format!("Basic {}", Base64::encode_string(b"zk_test:")));
        assert_eq!(client.base_url, "https://api.zerion.io/v1");
    }
}
