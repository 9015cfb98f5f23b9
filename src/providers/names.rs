// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reverse name resolution (address -> Basename).
//!
//! Resolution itself lives outside this service; deployments plug in a
//! resolver. [`CachedNameResolver`] keeps lookups cheap across requests.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;

use super::ProviderError;
use crate::address::address_key;
use crate::cache::TtlCache;

#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Primary name for `address`, if one is set.
    async fn reverse_name(&self, address: Address) -> Result<Option<String>, ProviderError>;
}

/// Resolver used when no name service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNameResolver;

#[async_trait]
impl NameResolver for NoNameResolver {
    async fn reverse_name(&self, _address: Address) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

/// TTL cache in front of another resolver. Negative answers are cached too.
pub struct CachedNameResolver {
    inner: Arc<dyn NameResolver>,
    cache: TtlCache<Option<String>>,
}

impl CachedNameResolver {
    pub fn new(inner: Arc<dyn NameResolver>, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(capacity, ttl),
        }
    }
}

#[async_trait]
impl NameResolver for CachedNameResolver {
    async fn reverse_name(&self, address: Address) -> Result<Option<String>, ProviderError> {
        let key = address_key(&address);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let name = self.inner.reverse_name(address).await?;
        self.cache.put(&key, name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingResolver {
        calls: AtomicU32,
    }

    #[async_trait]
    impl NameResolver for CountingResolver {
        async fn reverse_name(&self, _address: Address) -> Result<Option<String>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some("alice.base.eth".to_string()))
        }
    }

    #[tokio::test]
    async fn caches_lookups() {
        let inner = Arc::new(CountingResolver {
            calls: AtomicU32::new(0),
        });
        let cached = CachedNameResolver::new(inner.clone(), 16, Duration::from_secs(60));
        for _ in 0..3 {
            let name = cached.reverse_name(Address::ZERO).await.unwrap();
            assert_eq!(name.as_deref(), Some("alice.base.eth"));
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_resolver_returns_none() {
        assert!(NoNameResolver.reverse_name(Address::ZERO).await.unwrap().is_none());
    }
}
