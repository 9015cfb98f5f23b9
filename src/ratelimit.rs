// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyed token-bucket rate limiting.
//!
//! One limiter instance serves every throttled operation. Callers pick a key
//! of the form `<operation>:<identity>` so that buckets never interfere
//! across endpoints or callers.
//!
//! Notes:
//! - Per-process only (not distributed).
//! - Buckets that have refilled completely are dropped on a periodic sweep;
//!   a full bucket behaves exactly like a missing one.
//! - Deterministic tests via an injected [`TimeSource`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

/// Wall-clock abstraction shared by the limiter and the auth service.
pub trait TimeSource: Send + Sync + 'static {
    fn now_millis(&self) -> u64;

    fn now_secs(&self) -> u64 {
        self.now_millis() / 1000
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

pub type SharedClock = Arc<dyn TimeSource>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Milliseconds until the next call would be admitted.
    pub retry_after_ms: u64,
}

impl Decision {
    const ALLOW: Self = Self {
        allowed: true,
        retry_after_ms: 0,
    };

    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_ms.div_ceil(1000).max(1)
    }
}

/// Bucket shape: `burst` tokens, one token regained every `interval`.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub burst: u32,
    pub interval: Duration,
}

impl Quota {
    /// At most one call per `interval`.
    pub fn min_interval(interval: Duration) -> Self {
        Self { burst: 1, interval }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens_scaled: u128,
    last_ms: u64,
    /// When the bucket is back at capacity.
    full_at_ms: u64,
}

#[derive(Debug, Default)]
struct Buckets {
    by_key: HashMap<String, Bucket>,
    last_sweep_ms: u64,
}

const SCALE: u128 = 1_000_000;

/// Minimum spacing between sweeps of refilled buckets.
const SWEEP_EVERY_MS: u64 = 60_000;

pub struct KeyedRateLimiter {
    clock: SharedClock,
    buckets: Mutex<Buckets>,
}

impl KeyedRateLimiter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            buckets: Mutex::new(Buckets::default()),
        }
    }

    /// Number of buckets currently tracked.
    pub fn len(&self) -> usize {
        self.lock().by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buckets> {
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Take one token from the bucket identified by `key`.
    pub fn check(&self, key: &str, quota: Quota) -> Decision {
        let interval_ms = u128::try_from(quota.interval.as_millis()).unwrap_or(u128::MAX);
        if interval_ms == 0 {
            return Decision::ALLOW;
        }
        let k = if key.trim().is_empty() { "<unknown>" } else { key };
        let cap = u128::from(quota.burst.max(1)) * SCALE;

        let now = self.clock.now_millis();
        let mut guard = self.lock();
        if now.saturating_sub(guard.last_sweep_ms) >= SWEEP_EVERY_MS {
            guard.by_key.retain(|_, bucket| bucket.full_at_ms > now);
            guard.last_sweep_ms = now;
        }
        let bucket = guard.by_key.entry(k.to_string()).or_insert_with(|| Bucket {
            tokens_scaled: cap,
            last_ms: now,
            full_at_ms: now,
        });

        let elapsed = now.saturating_sub(bucket.last_ms);
        if elapsed > 0 {
            let refill = u128::from(elapsed).saturating_mul(SCALE) / interval_ms;
            bucket.tokens_scaled = bucket.tokens_scaled.saturating_add(refill).min(cap);
            bucket.last_ms = now;
        }

        if bucket.tokens_scaled >= SCALE {
            bucket.tokens_scaled -= SCALE;
            let refill_ms = ((cap - bucket.tokens_scaled) * interval_ms).div_ceil(SCALE);
            bucket.full_at_ms = now.saturating_add(u64::try_from(refill_ms).unwrap_or(u64::MAX));
            Decision::ALLOW
        } else {
            let missing = SCALE - bucket.tokens_scaled;
            let wait_ms = (missing * interval_ms).div_ceil(SCALE);
            Decision {
                allowed: false,
                retry_after_ms: u64::try_from(wait_ms).unwrap_or(u64::MAX),
            }
        }
    }
}
