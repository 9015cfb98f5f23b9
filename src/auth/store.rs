// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage seams for sign-in state.
//!
//! The in-memory implementations are per-process. Running more than one
//! replica requires a shared backend behind the same traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// Outstanding sign-in challenge for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChallenge {
    pub message: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Failed sign-in attempts inside the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounter {
    pub count: u32,
    pub window_reset_at: u64,
}

/// Challenge storage keyed by lowercase address.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Store `challenge`, replacing any previous one for `key`.
    async fn put(&self, key: &str, challenge: StoredChallenge);

    async fn get(&self, key: &str) -> Option<StoredChallenge>;

    /// Remove the challenge for `key` only if it still carries `message`.
    /// Returns whether this call removed it; at most one caller wins.
    async fn remove_if(&self, key: &str, message: &str) -> bool;

    /// Drop every challenge with `expires_at < now`.
    async fn purge_expired(&self, now: u64);
}

/// Failed-attempt counters keyed by lowercase address.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Current counter, or `None` when absent or its window has passed.
    async fn get(&self, key: &str, now: u64) -> Option<FailureCounter>;

    /// Count one failure, opening a new `window_secs` window when needed.
    async fn record_failure(&self, key: &str, now: u64, window_secs: u64) -> FailureCounter;

    async fn clear(&self, key: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Default)]
pub struct InMemoryNonceStore {
    challenges: Mutex<HashMap<String, StoredChallenge>>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.challenges).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn put(&self, key: &str, challenge: StoredChallenge) {
        lock(&self.challenges).insert(key.to_string(), challenge);
    }

    async fn get(&self, key: &str) -> Option<StoredChallenge> {
        lock(&self.challenges).get(key).cloned()
    }

    async fn remove_if(&self, key: &str, message: &str) -> bool {
        let mut challenges = lock(&self.challenges);
        if challenges.get(key).is_some_and(|c| c.message == message) {
            challenges.remove(key);
            true
        } else {
            false
        }
    }

    async fn purge_expired(&self, now: u64) {
        lock(&self.challenges).retain(|_, c| now <= c.expires_at);
    }
}

#[derive(Default)]
pub struct InMemoryRateLimitStore {
    counters: Mutex<HashMap<String, FailureCounter>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str, now: u64) -> Option<FailureCounter> {
        let mut counters = lock(&self.counters);
        match counters.get(key) {
            Some(counter) if now > counter.window_reset_at => {
                counters.remove(key);
                None
            }
            other => other.copied(),
        }
    }

    async fn record_failure(&self, key: &str, now: u64, window_secs: u64) -> FailureCounter {
        let mut counters = lock(&self.counters);
        let counter = counters
            .entry(key.to_string())
            .and_modify(|c| {
                if now > c.window_reset_at {
                    *c = FailureCounter {
                        count: 1,
                        window_reset_at: now + window_secs,
                    };
                } else {
                    c.count = c.count.saturating_add(1);
                }
            })
            .or_insert(FailureCounter {
                count: 1,
                window_reset_at: now + window_secs,
            });
        *counter
    }

    async fn clear(&self, key: &str) {
        lock(&self.counters).remove(key);
    }
}
