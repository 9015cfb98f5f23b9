// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation signer.
//!
//! Signing an attestation is a read-then-sign sequence: the contract's replay
//! nonce is read, embedded in the typed document, and signed. The nonce only
//! advances once a signed document is submitted on-chain, so two signatures
//! produced before that submission carry the same nonce and only one of them
//! can ever land.
//!
//! The sequence runs under a per-address async mutex. Inside it a small
//! ledger remembers the last nonce issued to each address; under
//! [`NoncePolicy::Exclusive`] a request that would reissue that nonce is
//! rejected until the chain reports a different one. [`NoncePolicy::Lease`]
//! also releases the nonce after a fixed hold and [`NoncePolicy::Shared`]
//! skips the ledger; both leave duplicate-nonce handling to the caller.
//!
//! A failed nonce read falls back to nonce 0 and signing proceeds. Such an
//! attestation is rejected on-chain whenever the real nonce is non-zero.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::Eip712Domain;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::typed_data::{self, domain, signing_hash};
use super::{normalize_score, CardInput};
use crate::address::{address_key, ValidationError};
use crate::blockchain::ScoreChainReader;
use crate::ratelimit::{KeyedRateLimiter, Quota, SharedClock};

#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Nonce {nonce} was already issued for this address and is awaiting submission")]
    NonceInFlight { nonce: U256, retry_after_secs: u64 },

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Suggested wait while an issued nonce has not been consumed on-chain.
pub const IN_FLIGHT_RETRY_SECS: u64 = 10;

/// How repeated nonces for one address are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoncePolicy {
    /// Refuse to reissue a nonce until the chain reports a different one.
    Exclusive,
    /// Refuse to reissue a nonce until the chain moves on or `hold` has
    /// passed. After the hold the same nonce is signed again, so the caller
    /// owns the duplicate-nonce risk.
    Lease { hold: Duration },
    /// Always sign; callers must handle duplicate nonces themselves.
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationKind {
    Score,
    ScoreCard,
}

impl AttestationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::ScoreCard => "score_card",
        }
    }
}

/// Signed `Score` attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedScore {
    pub score: u64,
    pub issued_at: u64,
    #[schema(value_type = u64)]
    pub nonce: u128,
    /// 65-byte `r || s || v` signature, `0x`-prefixed hex.
    pub signature: String,
}

/// Signed `ScoreCard` attestation. Wei amounts are integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedCard {
    pub total_score: u64,
    pub base_score: u64,
    pub security_score: u64,
    pub number_of_transactions: u64,
    pub current_streak: u64,
    pub max_streak: u64,
    #[schema(value_type = u64)]
    pub current_balance: u128,
    #[schema(value_type = u64)]
    pub avg_balance_last_month: u128,
    #[schema(value_type = u64)]
    pub gas_paid: u128,
    pub suspicious_tokens: u64,
    pub suspicious_contracts: u64,
    pub dangerous_interactions: u64,
    pub suspicious_oil_companies: u64,
    pub issued_at: u64,
    #[schema(value_type = u64)]
    pub nonce: u128,
    pub signature: String,
}

#[derive(Debug, Clone, Copy)]
struct Issued {
    nonce: U256,
    at_ms: u64,
}

/// Everything a signing call needs once it holds the address lock.
struct Ticket {
    nonce: U256,
    issued_at: u64,
}

pub struct AttestationSigner {
    chain: Arc<dyn ScoreChainReader>,
    key: Option<PrivateKeySigner>,
    limiter: Arc<KeyedRateLimiter>,
    clock: SharedClock,
    min_interval: Duration,
    policy: NoncePolicy,
    locks: Mutex<HashMap<Address, Arc<tokio::sync::Mutex<()>>>>,
    ledger: Mutex<HashMap<Address, Issued>>,
}

/// Parse a hex private key, with or without `0x`.
pub fn parse_signer_key(hex_key: &str) -> Result<PrivateKeySigner, AttestationError> {
    let bytes = alloy::hex::decode(hex_key.trim())
        .map_err(|e| AttestationError::Signing(format!("invalid signer key: {e}")))?;
    PrivateKeySigner::from_slice(&bytes)
        .map_err(|e| AttestationError::Signing(format!("invalid signer key: {e}")))
}

fn u256_to_u128(value: U256) -> u128 {
    u128::try_from(value).unwrap_or(u128::MAX)
}

impl AttestationSigner {
    pub fn new(
        chain: Arc<dyn ScoreChainReader>,
        key: Option<PrivateKeySigner>,
        limiter: Arc<KeyedRateLimiter>,
        clock: SharedClock,
        min_interval: Duration,
        policy: NoncePolicy,
    ) -> Self {
        Self {
            chain,
            key,
            limiter,
            clock,
            min_interval,
            policy,
            locks: Mutex::new(HashMap::new()),
            ledger: Mutex::new(HashMap::new()),
        }
    }

    /// Address of the configured signing key.
    pub fn signer_address(&self) -> Option<Address> {
        self.key.as_ref().map(|k| k.address())
    }

    /// Sign a `Score` attestation for `user`.
    pub async fn sign_score(
        &self,
        user: Address,
        score: f64,
    ) -> Result<SignedScore, AttestationError> {
        let score = normalize_score("score", score)?;
        let (key, domain) = self.configured()?;
        self.throttle(AttestationKind::Score, &user)?;

        let lock = self.lock_for(user);
        let _guard = lock.lock().await;
        let ticket = self.ticket(user).await?;

        let document = typed_data::Score {
            user,
            score: U256::from(score),
            issuedAt: U256::from(ticket.issued_at),
            nonce: ticket.nonce,
        };
        let signature = sign(key, &signing_hash(&document, &domain))?;
        self.record(user, ticket.nonce);
        info!(
            %user,
            score,
            nonce = %ticket.nonce,
            issued_at = ticket.issued_at,
            "score attestation signed"
        );

        Ok(SignedScore {
            score,
            issued_at: ticket.issued_at,
            nonce: u256_to_u128(ticket.nonce),
            signature,
        })
    }

    /// Sign a `ScoreCard` attestation for `user`.
    pub async fn sign_card(
        &self,
        user: Address,
        input: &CardInput,
    ) -> Result<SignedCard, AttestationError> {
        let card = input.normalize()?;
        let (key, domain) = self.configured()?;
        self.throttle(AttestationKind::ScoreCard, &user)?;

        let lock = self.lock_for(user);
        let _guard = lock.lock().await;
        let ticket = self.ticket(user).await?;

        let document = typed_data::ScoreCard {
            user,
            totalScore: U256::from(card.total_score),
            baseScore: U256::from(card.base_score),
            securityScore: U256::from(card.security_score),
            numberOfTransactions: U256::from(card.tx_count),
            currentStreak: U256::from(card.current_streak),
            maxStreak: U256::from(card.max_streak),
            currentBalance: U256::from(card.current_balance_wei),
            avgBalanceLastMonth: U256::from(card.avg_balance_wei),
            gasPaid: U256::from(card.gas_paid_wei),
            suspiciousTokens: U256::from(card.suspicious_tokens),
            suspiciousContracts: U256::from(card.suspicious_contracts),
            dangerousInteractions: U256::from(card.dangerous_interactions),
            suspiciousOilCompanies: U256::from(card.suspicious_nfts),
            issuedAt: U256::from(ticket.issued_at),
            nonce: ticket.nonce,
        };
        let signature = sign(key, &signing_hash(&document, &domain))?;
        self.record(user, ticket.nonce);
        info!(
            %user,
            total = card.total_score,
            nonce = %ticket.nonce,
            issued_at = ticket.issued_at,
            "score card attestation signed"
        );

        Ok(SignedCard {
            total_score: card.total_score,
            base_score: card.base_score,
            security_score: card.security_score,
            number_of_transactions: card.tx_count,
            current_streak: card.current_streak,
            max_streak: card.max_streak,
            current_balance: card.current_balance_wei,
            avg_balance_last_month: card.avg_balance_wei,
            gas_paid: card.gas_paid_wei,
            suspicious_tokens: card.suspicious_tokens,
            suspicious_contracts: card.suspicious_contracts,
            dangerous_interactions: card.dangerous_interactions,
            suspicious_oil_companies: card.suspicious_nfts,
            issued_at: ticket.issued_at,
            nonce: u256_to_u128(ticket.nonce),
            signature,
        })
    }

    fn configured(&self) -> Result<(&PrivateKeySigner, Eip712Domain), AttestationError> {
        let contract = self
            .chain
            .contract()
            .ok_or(AttestationError::NotConfigured("ScoreChecker address"))?;
        let key = self.key.as_ref().ok_or(AttestationError::NotConfigured("Signer"))?;
        Ok((key, domain(self.chain.chain_id(), contract)))
    }

    fn throttle(&self, kind: AttestationKind, user: &Address) -> Result<(), AttestationError> {
        let key = format!("attest:{}:{}", kind.as_str(), address_key(user));
        let decision = self.limiter.check(&key, Quota::min_interval(self.min_interval));
        if decision.allowed {
            Ok(())
        } else {
            Err(AttestationError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            })
        }
    }

    fn lock_for(&self, user: Address) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Drop locks nobody holds or waits on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(user).or_default())
    }

    /// Read nonce and issuance time. Must run under the address lock.
    async fn ticket(&self, user: Address) -> Result<Ticket, AttestationError> {
        let nonce = match self.chain.nonce(user).await {
            Ok(nonce) => nonce,
            Err(err) => {
                warn!(%user, error = %err, "nonce read failed, signing with nonce 0");
                U256::ZERO
            }
        };

        if let Some(retry_after_secs) = self.in_flight(user, nonce) {
            return Err(AttestationError::NonceInFlight {
                nonce,
                retry_after_secs,
            });
        }

        let issued_at = match self.chain.latest_block_timestamp().await {
            Ok(ts) => ts,
            Err(err) => {
                warn!(error = %err, "block timestamp read failed, using local clock");
                self.clock.now_secs()
            }
        };
        Ok(Ticket { nonce, issued_at })
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, HashMap<Address, Issued>> {
        match self.ledger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seconds to wait if `nonce` was already issued to `user` and is still
    /// held. Entries the chain has moved past, or whose lease ran out, are
    /// evicted.
    fn in_flight(&self, user: Address, nonce: U256) -> Option<u64> {
        let hold_ms = match self.policy {
            NoncePolicy::Shared => return None,
            NoncePolicy::Exclusive => None,
            NoncePolicy::Lease { hold } => {
                Some(u64::try_from(hold.as_millis()).unwrap_or(u64::MAX))
            }
        };
        let now = self.clock.now_millis();
        let mut ledger = self.ledger();
        if let Some(hold_ms) = hold_ms {
            ledger.retain(|_, issued| now.saturating_sub(issued.at_ms) < hold_ms);
        }

        let issued = *ledger.get(&user)?;
        if issued.nonce != nonce {
            ledger.remove(&user);
            return None;
        }
        match hold_ms {
            None => Some(IN_FLIGHT_RETRY_SECS),
            Some(hold_ms) => {
                let remaining = hold_ms.saturating_sub(now.saturating_sub(issued.at_ms));
                Some(remaining.div_ceil(1000).max(1))
            }
        }
    }

    fn record(&self, user: Address, nonce: U256) {
        if self.policy == NoncePolicy::Shared {
            return;
        }
        let at_ms = self.clock.now_millis();
        self.ledger().insert(user, Issued { nonce, at_ms });
    }

    #[cfg(test)]
    fn ledger_len(&self) -> usize {
        self.ledger().len()
    }
}

fn sign(
    key: &PrivateKeySigner,
    hash: &alloy::primitives::B256,
) -> Result<String, AttestationError> {
    let signature = key
        .sign_hash_sync(hash)
        .map_err(|e| AttestationError::Signing(e.to_string()))?;
    Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
}
