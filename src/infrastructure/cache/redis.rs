//! Redis cache store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use tracing::{info, warn};

use crate::domain::DomainError;
use crate::domain::cache::CacheStore;

/// Deletes the lock key only while it still holds the caller's token
const UNLOCK_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// `maxmemory` applied with `CONFIG SET` after connecting (e.g. "256mb")
    pub max_memory: Option<String>,
    /// `maxmemory-policy` applied with `CONFIG SET` (e.g. "volatile-lfu")
    pub max_memory_policy: Option<String>,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            max_memory: None,
            max_memory_policy: None,
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the server memory limit applied on connect
    pub fn with_max_memory(mut self, max_memory: impl Into<String>) -> Self {
        self.max_memory = Some(max_memory.into());
        self
    }

    /// Sets the server eviction policy applied on connect
    pub fn with_max_memory_policy(mut self, policy: impl Into<String>) -> Self {
        self.max_memory_policy = Some(policy.into());
        self
    }

    /// `CONFIG SET` parameter/value pairs for the configured memory settings
    fn memory_settings(&self) -> Vec<(&'static str, &str)> {
        let mut settings = Vec::new();

        if let Some(max_memory) = &self.max_memory {
            settings.push(("maxmemory", max_memory.as_str()));
        }
        if let Some(policy) = &self.max_memory_policy {
            settings.push(("maxmemory-policy", policy.as_str()));
        }

        settings
    }
}

/// Redis cache store, shared by every service instance
///
/// Features:
/// - TTL support per entry (SET EX)
/// - Token-scoped locks (SET NX PX, compare-and-delete script)
/// - Fixed-window counters (INCR + EXPIRE in one transaction)
/// - Connection pooling via ConnectionManager
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    unlock_script: Script,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            DomainError::cache_unavailable(format!(
                "Timed out connecting to Redis after {:?}",
                config.connection_timeout
            ))
        })?
        .map_err(|e| DomainError::cache_unavailable(format!("Failed to connect to Redis: {}", e)))?;

        let cache = Self {
            connection,
            unlock_script: Script::new(UNLOCK_SCRIPT),
            config,
        };

        // CONFIG may be disabled on managed servers
        if let Err(e) = cache.configure_memory().await {
            warn!(error = %e, "Failed to apply Redis memory settings");
        }

        Ok(cache)
    }

    /// Applies the configured `maxmemory` settings to the server
    pub async fn configure_memory(&self) -> Result<(), DomainError> {
        let settings = self.config.memory_settings();
        if settings.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection.clone();

        for (parameter, value) in settings {
            redis::cmd("CONFIG")
                .arg("SET")
                .arg(parameter)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::cache_unavailable(format!(
                        "Redis CONFIG SET {} failed: {}",
                        parameter, e
                    ))
                })?;
        }

        info!(
            max_memory = self.config.max_memory.as_deref().unwrap_or("unchanged"),
            policy = self.config.max_memory_policy.as_deref().unwrap_or("unchanged"),
            "Redis memory settings applied"
        );

        Ok(())
    }

    /// Creates a Redis cache with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisCacheConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache_unavailable(format!(
                    "Redis connection error: {}. Check that the Redis server is running",
                    e
                ))
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<Vec<u8>> = conn.get(&prefixed_key).await.map_err(|e| {
            DomainError::cache_unavailable(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(&prefixed_key, value, ttl_secs)
            .await
            .map_err(|e| {
                DomainError::cache_unavailable(format!("Failed to set key '{}': {}", key, e))
            })?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.del(&prefixed_key).await.map_err(|e| {
            DomainError::cache_unavailable(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    async fn try_lock(
        &self,
        key: &str,
        token: &str,
        hold: Duration,
    ) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let hold_millis = hold.as_millis().max(1) as u64;

        // SET NX PX: claim and expiry in one atomic command
        let result: Option<String> = redis::cmd("SET")
            .arg(&prefixed_key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(hold_millis)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache_unavailable(format!("Failed to lock '{}': {}", key, e))
            })?;

        // Redis returns "OK" if set, None if key existed
        Ok(result.is_some())
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = self
            .unlock_script
            .key(&prefixed_key)
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache_unavailable(format!("Failed to unlock '{}': {}", key, e))
            })?;

        Ok(deleted > 0)
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u64, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let window_secs = window.as_secs().max(1) as i64;

        // EXPIRE NX keeps the window anchored at the first hit
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&prefixed_key, 1)
            .cmd("EXPIRE")
            .arg(&prefixed_key)
            .arg(window_secs)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache_unavailable(format!("Failed to increment key '{}': {}", key, e))
            })?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache.ping().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", b"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result = cache.get("key1").await.unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));

        // Cleanup
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_lock_is_token_scoped() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        let hold = Duration::from_secs(5);

        assert!(cache.try_lock("lock:k", "t1", hold).await.unwrap());
        assert!(!cache.try_lock("lock:k", "t2", hold).await.unwrap());
        assert!(!cache.unlock("lock:k", "t2").await.unwrap());
        assert!(cache.unlock("lock:k", "t1").await.unwrap());
        assert!(cache.try_lock("lock:k", "t2", hold).await.unwrap());

        // Cleanup
        cache.unlock("lock:k", "t2").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_increment() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        let window = Duration::from_secs(60);

        assert_eq!(cache.increment("counter", window).await.unwrap(), 1);
        assert_eq!(cache.increment("counter", window).await.unwrap(), 2);

        // Cleanup
        cache.delete("counter").await.unwrap();
    }

    #[test]
    fn test_memory_settings() {
        assert!(RedisCacheConfig::default().memory_settings().is_empty());

        let config = RedisCacheConfig::default()
            .with_max_memory("256mb")
            .with_max_memory_policy("volatile-lfu");

        assert_eq!(
            config.memory_settings(),
            vec![("maxmemory", "256mb"), ("maxmemory-policy", "volatile-lfu")]
        );

        let config = RedisCacheConfig::default().with_max_memory_policy("allkeys-lru");
        assert_eq!(config.memory_settings(), vec![("maxmemory-policy", "allkeys-lru")]);
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_configure_memory() {
        let cache = RedisCache::new(
            get_test_config()
                .with_max_memory("256mb")
                .with_max_memory_policy("volatile-lfu"),
        )
        .await
        .unwrap();

        cache.configure_memory().await.unwrap();
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisCacheConfig::new("redis://localhost").with_key_prefix("myapp");

        assert_eq!(config.key_prefix, Some("myapp".to_string()));
    }
}
