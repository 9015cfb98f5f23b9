// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sign-in challenges.
//!
//! Per address: `NONE -> CHALLENGED -> VERIFIED (consumed) | EXPIRED`.
//!
//! - `create_challenge` stores one human-readable message per address,
//!   replacing any earlier one.
//! - `verify` recovers the EIP-191 signer of that message and, on a match,
//!   consumes the challenge and returns session claims.
//! - Every failure inside `verify` counts toward a per-address lockout; the
//!   lockout is checked before anything else.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Signature};
use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, warn};

use super::claims::SessionClaims;
use super::store::{NonceStore, RateLimitStore, StoredChallenge};
use super::AuthError;
use crate::address::address_key;
use crate::ratelimit::SharedClock;

pub const CHALLENGE_TTL: Duration = Duration::from_secs(600);
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const FAILURE_WINDOW: Duration = Duration::from_secs(3600);

const NONCE_BYTES: usize = 24;
const SIGNATURE_HEX_LEN: usize = 132;

/// Challenge handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub address: Address,
    pub message: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

pub struct ChallengeService {
    nonces: Arc<dyn NonceStore>,
    failures: Arc<dyn RateLimitStore>,
    clock: SharedClock,
    rng: SystemRandom,
}

impl ChallengeService {
    pub fn new(
        nonces: Arc<dyn NonceStore>,
        failures: Arc<dyn RateLimitStore>,
        clock: SharedClock,
    ) -> Self {
        Self {
            nonces,
            failures,
            clock,
            rng: SystemRandom::new(),
        }
    }

    fn random_nonce(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; NONCE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::InternalError("random source unavailable".to_string()))?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }

    pub async fn create_challenge(&self, address: Address) -> Result<Challenge, AuthError> {
        let now = self.clock.now_secs();
        self.nonces.purge_expired(now).await;

        let message = format!(
            "BaseBadge login for {address} :: {} :: {now}",
            self.random_nonce()?
        );
        let expires_at = now + CHALLENGE_TTL.as_secs();
        self.nonces
            .put(
                &address_key(&address),
                StoredChallenge {
                    message: message.clone(),
                    issued_at: now,
                    expires_at,
                },
            )
            .await;
        info!(%address, expires_at, "sign-in challenge issued");

        Ok(Challenge {
            address,
            message,
            issued_at: now,
            expires_at,
        })
    }

    /// Check `signature` against the outstanding challenge for `address`.
    pub async fn verify(
        &self,
        address: Address,
        signature: &str,
    ) -> Result<SessionClaims, AuthError> {
        let key = address_key(&address);
        let now = self.clock.now_secs();

        if let Some(counter) = self.failures.get(&key, now).await {
            if counter.count >= MAX_FAILED_ATTEMPTS {
                warn!(%address, failures = counter.count, "sign-in locked out");
                return Err(AuthError::TooManyAttempts {
                    retry_after_secs: counter.window_reset_at.saturating_sub(now).max(1),
                });
            }
        }

        let challenge = self.nonces.get(&key).await;
        self.nonces.purge_expired(now).await;

        let Some(challenge) = challenge else {
            return Err(self.fail(&key, AuthError::ChallengeNotFound).await);
        };
        if now > challenge.expires_at {
            self.nonces.remove_if(&key, &challenge.message).await;
            return Err(self.fail(&key, AuthError::ChallengeExpired).await);
        }
        if !signature.starts_with("0x") || signature.len() != SIGNATURE_HEX_LEN {
            return Err(self.fail(&key, AuthError::InvalidSignatureFormat).await);
        }

        let recovered = Signature::from_str(signature)
            .ok()
            .and_then(|sig| sig.recover_address_from_msg(challenge.message.as_bytes()).ok());
        if recovered != Some(address) {
            return Err(self.fail(&key, AuthError::SignatureMismatch).await);
        }

        // Consumed by a concurrent verify or replaced by a newer challenge.
        if !self.nonces.remove_if(&key, &challenge.message).await {
            return Err(self.fail(&key, AuthError::ChallengeNotFound).await);
        }
        self.failures.clear(&key).await;
        info!(%address, "wallet sign-in verified");

        let iat = i64::try_from(now).unwrap_or(i64::MAX);
        Ok(SessionClaims::for_address(&address, iat))
    }

    async fn fail(&self, key: &str, err: AuthError) -> AuthError {
        let counter = self
            .failures
            .record_failure(key, self.clock.now_secs(), FAILURE_WINDOW.as_secs())
            .await;
        warn!(
            address = key,
            failures = counter.count,
            reason = err.error_code(),
            "sign-in attempt failed"
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{InMemoryNonceStore, InMemoryRateLimitStore};
    use crate::ratelimit::tests::FakeTime;
    use crate::ratelimit::TimeSource;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    struct Harness {
        time: Arc<FakeTime>,
        nonces: Arc<InMemoryNonceStore>,
        failures: Arc<InMemoryRateLimitStore>,
        service: Arc<ChallengeService>,
        wallet: PrivateKeySigner,
    }

    fn harness() -> Harness {
        let time = Arc::new(FakeTime::new(1_700_000_000_000));
        let nonces = Arc::new(InMemoryNonceStore::new());
        let failures = Arc::new(InMemoryRateLimitStore::new());
        let service = Arc::new(ChallengeService::new(
            nonces.clone(),
            failures.clone(),
            time.clone(),
        ));
        Harness {
            time,
            nonces,
            failures,
            service,
            wallet: PrivateKeySigner::from_slice(&[0x11; 32]).unwrap(),
        }
    }

    fn sign(wallet: &PrivateKeySigner, message: &str) -> String {
        let sig = wallet.sign_message_sync(message.as_bytes()).unwrap();
        alloy::hex::encode_prefixed(sig.as_bytes())
    }

    #[tokio::test]
    async fn message_binds_address_and_time() {
        let h = harness();
        let c = h.service.create_challenge(h.wallet.address()).await.unwrap();
        let prefix = format!("BaseBadge login for {} :: ", h.wallet.address());
        assert!(c.message.starts_with(&prefix));
        assert!(c.message.ends_with(" :: 1700000000"));
        assert_eq!(c.expires_at - c.issued_at, 600);
    }

    #[tokio::test]
    async fn valid_signature_issues_claims_once() {
        let h = harness();
        let address = h.wallet.address();
        let c = h.service.create_challenge(address).await.unwrap();
        let signature = sign(&h.wallet, &c.message);

        let claims = h.service.verify(address, &signature).await.unwrap();
        assert_eq!(claims.sub, address.to_string());
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(h.nonces.is_empty());

        // Replay of the same signature is rejected.
        assert!(matches!(
            h.service.verify(address, &signature).await,
            Err(AuthError::ChallengeNotFound)
        ));
    }

    #[tokio::test]
    async fn new_challenge_invalidates_previous() {
        let h = harness();
        let address = h.wallet.address();
        let first = h.service.create_challenge(address).await.unwrap();
        let _second = h.service.create_challenge(address).await.unwrap();
        let stale = sign(&h.wallet, &first.message);
        assert!(matches!(
            h.service.verify(address, &stale).await,
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[tokio::test]
    async fn expired_challenge_is_rejected() {
        let h = harness();
        let address = h.wallet.address();
        let c = h.service.create_challenge(address).await.unwrap();
        let signature = sign(&h.wallet, &c.message);
        h.time.advance_ms(601_000);
        assert!(matches!(
            h.service.verify(address, &signature).await,
            Err(AuthError::ChallengeExpired)
        ));
        assert!(h.nonces.is_empty());
        let now = h.time.now_secs();
        assert_eq!(h.failures.get(&address_key(&address), now).await.unwrap().count, 1);

        // Gone after the first rejection.
        assert!(matches!(
            h.service.verify(address, &signature).await,
            Err(AuthError::ChallengeNotFound)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_verifies_consume_a_challenge_once() {
        const RACERS: usize = 8;
        for _ in 0..20 {
            let h = harness();
            let address = h.wallet.address();
            let c = h.service.create_challenge(address).await.unwrap();
            let signature = sign(&h.wallet, &c.message);

            let barrier = Arc::new(tokio::sync::Barrier::new(RACERS));
            let mut tasks = tokio::task::JoinSet::new();
            for _ in 0..RACERS {
                let service = h.service.clone();
                let barrier = barrier.clone();
                let signature = signature.clone();
                tasks.spawn(async move {
                    barrier.wait().await;
                    service.verify(address, &signature).await.is_ok()
                });
            }
            let mut successes = 0;
            while let Some(joined) = tasks.join_next().await {
                if joined.unwrap() {
                    successes += 1;
                }
            }
            assert_eq!(successes, 1);
        }
    }

    #[tokio::test]
    async fn wrong_signer_and_bad_format_fail() {
        let h = harness();
        let address = h.wallet.address();
        let c = h.service.create_challenge(address).await.unwrap();

        let impostor = PrivateKeySigner::from_slice(&[0x22; 32]).unwrap();
        assert!(matches!(
            h.service.verify(address, &sign(&impostor, &c.message)).await,
            Err(AuthError::SignatureMismatch)
        ));
        assert!(matches!(
            h.service.verify(address, "0x1234").await,
            Err(AuthError::InvalidSignatureFormat)
        ));
        // The challenge survives failed attempts.
        let ok = sign(&h.wallet, &c.message);
        assert!(h.service.verify(address, &ok).await.is_ok());
    }

    #[tokio::test]
    async fn five_failures_lock_out_before_lookup() {
        let h = harness();
        let address = h.wallet.address();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(matches!(
                h.service.verify(address, "0xbad").await,
                Err(AuthError::ChallengeNotFound)
            ));
        }

        // Even a valid challenge and signature are refused now.
        let c = h.service.create_challenge(address).await.unwrap();
        let signature = sign(&h.wallet, &c.message);
        assert!(matches!(
            h.service.verify(address, &signature).await,
            Err(AuthError::TooManyAttempts { retry_after_secs: 3600 })
        ));
        assert!(!h.nonces.is_empty());

        // The window resets after an hour.
        h.time.advance_ms(3_601_000);
        let c = h.service.create_challenge(address).await.unwrap();
        let signature = sign(&h.wallet, &c.message);
        assert!(h.service.verify(address, &signature).await.is_ok());
    }

    #[tokio::test]
    async fn success_clears_failures() {
        let h = harness();
        let address = h.wallet.address();
        for _ in 0..4 {
            let _ = h.service.verify(address, "0xbad").await;
        }
        let c = h.service.create_challenge(address).await.unwrap();
        h.service
            .verify(address, &sign(&h.wallet, &c.message))
            .await
            .unwrap();
        for _ in 0..4 {
            let _ = h.service.verify(address, "0xbad").await;
        }
        let c = h.service.create_challenge(address).await.unwrap();
        assert!(h
            .service
            .verify(address, &sign(&h.wallet, &c.message))
            .await
            .is_ok());
    }
}
