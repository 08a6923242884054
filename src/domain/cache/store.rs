//! Cache store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Shared key/value store with TTL expiry and a token-scoped lock primitive
///
/// Values are opaque byte strings. Implementations surface connectivity and
/// command failures as [`DomainError::CacheUnavailable`].
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Connectivity probe
    async fn ping(&self) -> Result<(), DomainError>;

    /// Gets a raw value
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Sets a raw value that expires after `ttl`
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Atomically claims `key` for `token` unless another holder has it.
    /// The claim expires on its own after `hold`.
    async fn try_lock(&self, key: &str, token: &str, hold: Duration)
    -> Result<bool, DomainError>;

    /// Releases `key` only if it is still held by `token`
    async fn unlock(&self, key: &str, token: &str) -> Result<bool, DomainError>;

    /// Increments a counter, starting a fresh `window` when the counter is new.
    /// Returns the value after incrementing.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, DomainError>;
}
