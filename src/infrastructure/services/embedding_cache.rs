//! Stampede-safe embedding cache
//!
//! Memoizes provider output in the shared store. On a miss the caller takes a
//! store-level lock on the key and re-reads before computing, so concurrent
//! callers across every service instance trigger at most one computation per
//! key.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::DomainError;
use crate::domain::cache::{
    CacheStore, EmbeddingKey, LockHandle, LockOptions, decode_vector, encode_vector,
};
use crate::domain::embedding::EmbeddingProvider;
use crate::infrastructure::observability::{
    LookupOutcome, record_embedding_computation, record_embedding_lookup,
};

/// Configuration for the embedding cache
#[derive(Debug, Clone)]
pub struct EmbeddingCacheConfig {
    /// Lock timing for cold keys
    pub lock: LockOptions,
    /// Upper bound on the connectivity probe
    pub probe_timeout: Duration,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            lock: LockOptions::default(),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl EmbeddingCacheConfig {
    pub fn with_lock_options(mut self, lock: LockOptions) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Embedding provider fronted by the shared cache store
#[derive(Debug)]
pub struct EmbeddingCache {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingCacheConfig,
}

impl EmbeddingCache {
    pub fn new(store: Arc<dyn CacheStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(store, provider, EmbeddingCacheConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: EmbeddingCacheConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the embedding of `text`, computing and caching it on a miss.
    ///
    /// `cache_key` defaults to `text` itself. `ttl` must be a positive whole
    /// number of seconds.
    pub async fn get_or_compute(
        &self,
        text: &str,
        cache_key: Option<&EmbeddingKey>,
        ttl: Duration,
    ) -> Result<Vec<f32>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::invalid_argument("Text must not be empty"));
        }
        validate_ttl(ttl)?;

        let default_key;
        let key = match cache_key {
            Some(key) => key,
            None => {
                default_key = EmbeddingKey::raw(text);
                &default_key
            }
        };

        self.probe().await?;

        if let Some(vector) = self.read(key).await? {
            debug!(key = %key, "Embedding cache hit");
            record_embedding_lookup(LookupOutcome::Hit);
            return Ok(vector);
        }

        let lock =
            LockHandle::acquire(self.store.clone(), key.lock_key(), &self.config.lock).await?;

        let result = self.compute_locked(text, key, ttl).await;

        if let Err(e) = lock.release().await {
            warn!(key = %key, error = %e, "Failed to release embedding lock");
        }

        result
    }

    async fn compute_locked(
        &self,
        text: &str,
        key: &EmbeddingKey,
        ttl: Duration,
    ) -> Result<Vec<f32>, DomainError> {
        // Another holder may have filled the key while we waited
        if let Some(vector) = self.read(key).await? {
            debug!(key = %key, "Embedding computed by another holder");
            record_embedding_lookup(LookupOutcome::ContendedHit);
            return Ok(vector);
        }

        debug!(key = %key, "Embedding cache miss, computing");
        record_embedding_lookup(LookupOutcome::Miss);

        let vector = self.compute(text, key).await?;

        self.store.set(key.as_str(), &encode_vector(&vector), ttl).await?;

        Ok(vector)
    }

    async fn compute(&self, text: &str, key: &EmbeddingKey) -> Result<Vec<f32>, DomainError> {
        let provider = self.provider.clone();
        let provider_name = provider.provider_name();
        let owned_text = text.to_string();
        let start = Instant::now();

        let outcome = tokio::task::spawn_blocking(move || provider.encode(&owned_text))
            .await
            .map_err(|e| DomainError::computation_failed(key.as_str(), e.to_string()))
            .and_then(|result| {
                result.map_err(|e| DomainError::computation_failed(key.as_str(), e.to_string()))
            });

        let elapsed = start.elapsed();
        record_embedding_computation(provider_name, elapsed, outcome.is_ok());

        match &outcome {
            Ok(vector) => debug!(
                key = %key,
                dimensions = vector.len(),
                duration_ms = elapsed.as_millis() as u64,
                "Embedding computed"
            ),
            Err(e) => warn!(key = %key, error = %e, "Embedding computation failed"),
        }

        outcome
    }

    async fn probe(&self) -> Result<(), DomainError> {
        match tokio::time::timeout(self.config.probe_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(match e {
                DomainError::CacheUnavailable { .. } => e,
                other => DomainError::cache_unavailable(other.to_string()),
            }),
            Err(_) => Err(DomainError::cache_unavailable(format!(
                "Cache store did not answer within {:?}",
                self.config.probe_timeout
            ))),
        }
    }

    /// Reads and decodes a cached vector. Undecodable values and vectors whose
    /// length differs from the provider's declared dimensions count as misses.
    async fn read(&self, key: &EmbeddingKey) -> Result<Option<Vec<f32>>, DomainError> {
        let Some(bytes) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };

        match decode_vector(&bytes) {
            Ok(vector) => match self.provider.dimensions() {
                Some(expected) if vector.len() != expected => {
                    warn!(
                        key = %key,
                        expected,
                        actual = vector.len(),
                        "Discarding cached embedding from a different model"
                    );
                    Ok(None)
                }
                _ => Ok(Some(vector)),
            },
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cached embedding");
                Ok(None)
            }
        }
    }
}

fn validate_ttl(ttl: Duration) -> Result<(), DomainError> {
    if ttl.is_zero() || ttl.subsec_nanos() != 0 {
        return Err(DomainError::invalid_argument(format!(
            "TTL must be a positive whole number of seconds, got {:?}",
            ttl
        )));
    }
    Ok(())
}
