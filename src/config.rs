// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup via [`AppConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `BASE_RPC_URL` | Base JSON-RPC endpoint | `https://mainnet.base.org` |
//! | `CHAIN_ID` | Chain id embedded in the EIP-712 domain | `8453` |
//! | `SCORE_CHECKER_V2_ADDRESS` | ScoreChecker (verifying contract) | Needed to sign |
//! | `AUTHORIZED_SIGNER_PRIVATE_KEY` | Hex secp256k1 attestation key | Needed to sign |
//! | `JWT_SECRET` | HS256 secret for session tokens | Required for sign-in |
//! | `ADMIN_ADDRESSES` | Comma-separated admin wallet addresses | empty |
//! | `EXPLORER_API_URL` | Blockscout-style `txlist` endpoint | `https://base.blockscout.com/api` |
//! | `TOKEN_API_URL` | Etherscan-v2-style transfer endpoint | `https://api.etherscan.io/v2/api` |
//! | `ETHERSCAN_API_KEY` | API key for `TOKEN_API_URL` | empty |
//! | `PORTFOLIO_API_URL` | Zerion-style portfolio endpoint | `https://api.zerion.io/v1` |
//! | `ZERION_API_KEY` | API key for `PORTFOLIO_API_URL` | empty |
//! | `COLLECTOR_TIMEOUT_SECS` | Per-collector timeout | `12` |
//! | `AGGREGATOR_POOL_SIZE` | Max concurrently running collectors per request | `8` |
//! | `SCORE_MIN_INTERVAL_MS` | Min interval between score requests per caller | `1000` |
//! | `SIGN_MIN_INTERVAL_MS` | Min interval between attestations per address | `2000` |
//! | `NONCE_HOLD_SECS` | Release an unconsumed attestation nonce after N seconds | unset |
//! | `SCORE_CACHE_TTL_SECS` | TTL of cached score cards | `1800` |

use std::time::Duration;

use alloy::primitives::Address;

use crate::address::parse_address;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const BASE_RPC_URL_ENV: &str = "BASE_RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const SCORE_CHECKER_ENV: &str = "SCORE_CHECKER_V2_ADDRESS";
pub const SIGNER_KEY_ENV: &str = "AUTHORIZED_SIGNER_PRIVATE_KEY";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const ADMIN_ADDRESSES_ENV: &str = "ADMIN_ADDRESSES";
pub const EXPLORER_API_URL_ENV: &str = "EXPLORER_API_URL";
pub const TOKEN_API_URL_ENV: &str = "TOKEN_API_URL";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const PORTFOLIO_API_URL_ENV: &str = "PORTFOLIO_API_URL";
pub const ZERION_API_KEY_ENV: &str = "ZERION_API_KEY";
pub const COLLECTOR_TIMEOUT_ENV: &str = "COLLECTOR_TIMEOUT_SECS";
pub const POOL_SIZE_ENV: &str = "AGGREGATOR_POOL_SIZE";
pub const SCORE_MIN_INTERVAL_ENV: &str = "SCORE_MIN_INTERVAL_MS";
pub const SIGN_MIN_INTERVAL_ENV: &str = "SIGN_MIN_INTERVAL_MS";
pub const NONCE_HOLD_ENV: &str = "NONCE_HOLD_SECS";
pub const SCORE_CACHE_TTL_ENV: &str = "SCORE_CACHE_TTL_SECS";

pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const DEFAULT_EXPLORER_API_URL: &str = "https://base.blockscout.com/api";
pub const DEFAULT_TOKEN_API_URL: &str = "https://api.etherscan.io/v2/api";
pub const DEFAULT_PORTFOLIO_API_URL: &str = "https://api.zerion.io/v1";

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rpc_url: String,
    pub chain_id: u64,
    /// `None` makes every signing request fail closed.
    pub score_checker: Option<Address>,
    /// `None` makes every signing request fail closed.
    pub signer_key: Option<String>,
    /// `None` makes sign-in fail closed.
    pub jwt_secret: Option<String>,
    pub admin_addresses: Vec<Address>,
    pub explorer_api_url: String,
    pub token_api_url: String,
    pub etherscan_api_key: String,
    pub portfolio_api_url: String,
    pub zerion_api_key: String,
    pub collector_timeout: Duration,
    pub pool_size: usize,
    pub score_min_interval: Duration,
    pub sign_min_interval: Duration,
    /// `None` holds an issued nonce until the chain moves past it.
    pub nonce_hold: Option<Duration>,
    pub score_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            score_checker: None,
            signer_key: None,
            jwt_secret: None,
            admin_addresses: Vec::new(),
            explorer_api_url: DEFAULT_EXPLORER_API_URL.to_string(),
            token_api_url: DEFAULT_TOKEN_API_URL.to_string(),
            etherscan_api_key: String::new(),
            portfolio_api_url: DEFAULT_PORTFOLIO_API_URL.to_string(),
            zerion_api_key: String::new(),
            collector_timeout: Duration::from_secs(12),
            pool_size: 8,
            score_min_interval: Duration::from_millis(1000),
            sign_min_interval: Duration::from_millis(2000),
            nonce_hold: None,
            score_cache_ttl: Duration::from_secs(1800),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let score_checker = match get(SCORE_CHECKER_ENV) {
            Some(raw) => Some(parse_address(&raw).map_err(|_| ConfigError::InvalidValue {
                name: SCORE_CHECKER_ENV,
                value: raw,
            })?),
            None => None,
        };

        let admin_addresses = match get(ADMIN_ADDRESSES_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    parse_address(s).map_err(|_| ConfigError::InvalidValue {
                        name: ADMIN_ADDRESSES_ENV,
                        value: s.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or(defaults.host),
            port: parse_or(get(PORT_ENV), PORT_ENV, defaults.port)?,
            rpc_url: get(BASE_RPC_URL_ENV).unwrap_or(defaults.rpc_url),
            chain_id: parse_or(get(CHAIN_ID_ENV), CHAIN_ID_ENV, defaults.chain_id)?,
            score_checker,
            signer_key: get(SIGNER_KEY_ENV),
            jwt_secret: get(JWT_SECRET_ENV),
            admin_addresses,
            explorer_api_url: get(EXPLORER_API_URL_ENV).unwrap_or(defaults.explorer_api_url),
            token_api_url: get(TOKEN_API_URL_ENV).unwrap_or(defaults.token_api_url),
            etherscan_api_key: get(ETHERSCAN_API_KEY_ENV).unwrap_or_default(),
            portfolio_api_url: get(PORTFOLIO_API_URL_ENV).unwrap_or(defaults.portfolio_api_url),
            zerion_api_key: get(ZERION_API_KEY_ENV).unwrap_or_default(),
            collector_timeout: Duration::from_secs(parse_or(
                get(COLLECTOR_TIMEOUT_ENV),
                COLLECTOR_TIMEOUT_ENV,
                defaults.collector_timeout.as_secs(),
            )?),
            pool_size: parse_or(get(POOL_SIZE_ENV), POOL_SIZE_ENV, defaults.pool_size)?.max(1),
            score_min_interval: Duration::from_millis(parse_or(
                get(SCORE_MIN_INTERVAL_ENV),
                SCORE_MIN_INTERVAL_ENV,
                defaults.score_min_interval.as_millis() as u64,
            )?),
            sign_min_interval: Duration::from_millis(parse_or(
                get(SIGN_MIN_INTERVAL_ENV),
                SIGN_MIN_INTERVAL_ENV,
                defaults.sign_min_interval.as_millis() as u64,
            )?),
            nonce_hold: get(NONCE_HOLD_ENV)
                .map(|raw| {
                    raw.parse().map(Duration::from_secs).map_err(|_| {
                        ConfigError::InvalidValue {
                            name: NONCE_HOLD_ENV,
                            value: raw,
                        }
                    })
                })
                .transpose()?,
            score_cache_ttl: Duration::from_secs(parse_or(
                get(SCORE_CACHE_TTL_ENV),
                SCORE_CACHE_TTL_ENV,
                defaults.score_cache_ttl.as_secs(),
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.chain_id, 8453);
        assert_eq!(cfg.collector_timeout, Duration::from_secs(12));
        assert_eq!(cfg.pool_size, 8);
        assert!(cfg.signer_key.is_none());
        assert!(cfg.score_checker.is_none());
        assert!(cfg.admin_addresses.is_empty());
        assert!(cfg.nonce_hold.is_none());
    }

    #[test]
    fn nonce_hold_is_opt_in() {
        let cfg = load(&[(NONCE_HOLD_ENV, "120")]).unwrap();
        assert_eq!(cfg.nonce_hold, Some(Duration::from_secs(120)));
        assert!(load(&[(NONCE_HOLD_ENV, "soon")]).is_err());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let cfg = load(&[(SIGNER_KEY_ENV, "   "), (JWT_SECRET_ENV, "")]).unwrap();
        assert!(cfg.signer_key.is_none());
        assert!(cfg.jwt_secret.is_none());
    }

    #[test]
    fn parses_admin_list() {
        let cfg = load(&[(
            ADMIN_ADDRESSES_ENV,
            concat!(
                "0x1111111111111111111111111111111111111111, ",
                "0x2222222222222222222222222222222222222222,",
            ),
        )])
        .unwrap();
        assert_eq!(cfg.admin_addresses.len(), 2);
    }

    #[test]
    fn rejects_bad_contract_address() {
        let err = load(&[(SCORE_CHECKER_ENV, "0x1234")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: SCORE_CHECKER_ENV, .. }
        ));
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(load(&[(PORT_ENV, "eighty")]).is_err());
    }
}
