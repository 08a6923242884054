//! In-memory cache store implementation using moka
//!
//! Suitable for a single service instance: locks and counters live in this
//! process only.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;

use crate::domain::DomainError;
use crate::domain::cache::CacheStore;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    /// Creates a new configuration with specified max capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    ttl: Duration,
}

/// Expires every entry after its own TTL
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Debug)]
struct Claim {
    token: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct Counter {
    value: u64,
    expires_at: Instant,
}

/// Thread-safe in-memory cache store
///
/// Features:
/// - TTL support per entry
/// - LRU-like eviction when capacity is reached
/// - Expiring token-scoped locks
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    locks: Mutex<HashMap<String, Claim>>,
    counters: Mutex<HashMap<String, Counter>>,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self {
            cache,
            locks: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.cache.get(key).await.map(|entry| entry.data))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), DomainError> {
        let entry = CacheEntry {
            data: value.to_vec(),
            ttl,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn try_lock(
        &self,
        key: &str,
        token: &str,
        hold: Duration,
    ) -> Result<bool, DomainError> {
        let now = Instant::now();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(claim) = locks.get(key) {
            if claim.expires_at > now {
                return Ok(false);
            }
        }

        locks.insert(
            key.to_string(),
            Claim {
                token: token.to_string(),
                expires_at: now + hold,
            },
        );

        Ok(true)
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool, DomainError> {
        let now = Instant::now();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        match locks.get(key) {
            Some(claim) if claim.token == token => {
                let live = claim.expires_at > now;
                locks.remove(key);
                Ok(live)
            }
            _ => Ok(false),
        }
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u64, DomainError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        counters.retain(|_, counter| counter.expires_at > now);

        let counter = counters.entry(key.to_string()).or_insert_with(|| Counter {
            value: 0,
            expires_at: now + window,
        });
        counter.value += 1;

        Ok(counter.value)
    }
}
