//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use crate::domain::DomainError;
use crate::domain::cache::CacheStore;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Type of cache to create
    pub cache_type: CacheType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout (Redis only)
    pub connection_timeout: Duration,
    /// Maximum capacity (for in-memory cache)
    pub max_capacity: Option<u64>,
    /// Server `maxmemory` (Redis only)
    pub redis_max_memory: Option<String>,
    /// Server `maxmemory-policy` (Redis only)
    pub redis_max_memory_policy: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            max_capacity: None,
            redis_max_memory: None,
            redis_max_memory_policy: None,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for in-memory cache
    pub fn in_memory() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            ..Default::default()
        }
    }

    /// Creates a new configuration for Redis cache
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            cache_type: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the maximum capacity (in-memory only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }
}

/// Factory for creating cache stores
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache store based on configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn CacheStore>, DomainError> {
        match config.cache_type {
            CacheType::InMemory => {
                let mut in_memory_config = InMemoryCacheConfig::default();

                if let Some(capacity) = config.max_capacity {
                    in_memory_config = in_memory_config.with_max_capacity(capacity);
                }

                tracing::info!(
                    max_capacity = in_memory_config.max_capacity,
                    "Using in-memory cache store; locks are process-local"
                );

                Ok(Arc::new(InMemoryCache::with_config(in_memory_config)))
            }
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config =
                    RedisCacheConfig::new(url).with_connection_timeout(config.connection_timeout);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }
                if let Some(max_memory) = &config.redis_max_memory {
                    redis_config = redis_config.with_max_memory(max_memory.clone());
                }
                if let Some(policy) = &config.redis_max_memory_policy {
                    redis_config = redis_config.with_max_memory_policy(policy.clone());
                }

                let cache = RedisCache::new(redis_config).await?;
                tracing::info!("Using Redis cache store");

                Ok(Arc::new(cache))
            }
        }
    }
}
