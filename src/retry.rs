// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exponential backoff for transient upstream failures.
//!
//! Collectors wrap every provider call in [`with_backoff`]. Only errors that
//! report themselves as transient (rate limited, 5xx, timeout, connect) are
//! retried; everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use ring::rand::{SecureRandom, SystemRandom};
use tracing::warn;

/// Errors that can tell whether another attempt might succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Randomness for backoff jitter.
pub trait JitterSource: Send + Sync {
    /// A value in `0..=max`.
    fn jitter(&self, max: u64) -> u64;
}

impl JitterSource for SystemRandom {
    fn jitter(&self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        let mut bytes = [0u8; 8];
        if self.fill(&mut bytes).is_err() {
            return 0;
        }
        u64::from_le_bytes(bytes) % max.saturating_add(1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_millis(1_600),
        }
    }
}

impl RetryPolicy {
    /// Policy with no real waiting, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        }
    }

    /// Delay before the attempt following `attempt` (1-based), with up to 50% jitter.
    pub fn delay_for(&self, attempt: u32, rng: &dyn JitterSource) -> Duration {
        let exp = attempt.saturating_sub(1);
        let mult = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let capped = base_ms.saturating_mul(mult).min(max_ms);
        Duration::from_millis(capped.saturating_add(rng.jitter(capped / 2)))
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn with_backoff<T, E, F, Fut>(
    op: &'static str,
    policy: RetryPolicy,
    f: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_backoff_using(op, policy, &SystemRandom::new(), f).await
}

/// [`with_backoff`] with an explicit jitter source.
pub async fn with_backoff_using<T, E, F, Fut>(
    op: &'static str,
    policy: RetryPolicy,
    rng: &dyn JitterSource,
    mut f: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && err.is_transient() => {
                let delay = policy.delay_for(attempt, rng);
                warn!(
                    operation = op,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient upstream failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FakeError {
        transient: bool,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake (transient={})", self.transient)
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    /// Always answers `min(value, max)`.
    struct FixedJitter(u64);

    impl JitterSource for FixedJitter {
        fn jitter(&self, max: u64) -> u64 {
            self.0.min(max)
        }
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        let none = FixedJitter(0);
        assert_eq!(policy.delay_for(1, &none), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2, &none), Duration::from_millis(600));
        assert_eq!(policy.delay_for(10, &none), Duration::from_millis(1_600));
    }

    #[test]
    fn jitter_adds_at_most_half() {
        let policy = RetryPolicy::default();
        let full = FixedJitter(u64::MAX);
        assert_eq!(policy.delay_for(1, &full), Duration::from_millis(450));
        assert_eq!(policy.delay_for(10, &full), Duration::from_millis(2_400));
    }

    #[test]
    fn system_jitter_stays_in_range() {
        let rng = SystemRandom::new();
        assert_eq!(rng.jitter(0), 0);
        for _ in 0..100 {
            assert!(rng.jitter(150) <= 150);
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(4);
        let result: Result<u32, FakeError> =
            with_backoff_using("test", policy, &FixedJitter(0), || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(FakeError { transient: true })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_backoff("test", RetryPolicy::immediate(4), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { transient: false }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_backoff("test", RetryPolicy::immediate(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { transient: true }) }
        })
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
