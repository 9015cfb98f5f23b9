// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies used by the REST API. All types derive
//! `ToSchema` for OpenAPI documentation.
//!
//! Addresses arrive as raw strings and are validated in the handlers so that
//! a malformed address yields a JSON `400` with a readable message instead of
//! a generic extractor rejection.
//!
//! ## Model Categories
//!
//! - **Auth**: challenge and session-token exchange
//! - **Score**: score queries and badge listings
//! - **Attestation**: signing requests and contract parameters

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::attestation::CardInput;
use crate::scoring::Badge;

// =============================================================================
// Auth Models
// =============================================================================

/// Query for `GET /v1/auth/nonce`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NonceQuery {
    /// Wallet address requesting a challenge.
    pub address: String,
}

/// Sign-in challenge returned to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NonceResponse {
    /// Checksummed wallet address.
    pub address: String,
    /// Message to sign with `personal_sign`.
    pub nonce: String,
    /// Unix seconds after which the challenge is rejected.
    pub expires_at: u64,
}

/// Body for `POST /v1/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub address: String,
    /// `0x`-prefixed 65-byte signature over the challenge message.
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

// =============================================================================
// Score Models
// =============================================================================

/// Query carrying a single wallet address.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressQuery {
    pub address: String,
}

/// Query for `GET /v1/score/contract_info`; the address is optional.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OptionalAddressQuery {
    /// When present, the contract nonce for this address is included.
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BadgesResponse {
    pub address: String,
    pub badges: Vec<Badge>,
}

// =============================================================================
// Attestation Models
// =============================================================================

/// Query for `GET /v1/score/sign`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignScoreQuery {
    pub address: String,
    /// Total score, rounded to an integer in `0..=1_000_000`.
    pub score: f64,
}

/// Query for `GET /v1/score/sign_card`. Balances are in ETH.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignCardQuery {
    pub address: String,
    pub total_score: f64,
    pub base_score: f64,
    pub security_score: f64,
    pub tx_count: i64,
    pub current_streak: i64,
    pub max_streak: i64,
    pub current_balance: f64,
    pub avg_balance_last_month: f64,
    pub gas_paid: f64,
    pub suspicious_tokens: i64,
    pub suspicious_contracts: i64,
    pub dangerous_interactions: i64,
    pub suspicious_nfts: i64,
}

impl SignCardQuery {
    pub fn card_input(&self) -> CardInput {
        CardInput {
            total_score: self.total_score,
            base_score: self.base_score,
            security_score: self.security_score,
            tx_count: self.tx_count,
            current_streak: self.current_streak,
            max_streak: self.max_streak,
            current_balance: self.current_balance,
            avg_balance_last_month: self.avg_balance_last_month,
            gas_paid: self.gas_paid,
            suspicious_tokens: self.suspicious_tokens,
            suspicious_contracts: self.suspicious_contracts,
            dangerous_interactions: self.dangerous_interactions,
            suspicious_nfts: self.suspicious_nfts,
        }
    }
}

/// ScoreChecker parameters as read from chain.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfoResponse {
    pub rpc: String,
    pub chain_id: u64,
    pub contract: String,
    #[serde(rename = "authorizedSigner_onchain")]
    pub authorized_signer_onchain: String,
    /// Fee in wei.
    pub check_fee: String,
    pub min_interval: u64,
    pub max_sig_age: u64,
    /// Present only when an address was supplied.
    #[schema(value_type = Option<u64>)]
    pub nonce: Option<u128>,
}
