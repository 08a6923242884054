//! Store-backed mutual exclusion scoped to a single cache key

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::CacheStore;
use crate::domain::DomainError;

/// Timing parameters for lock acquisition
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// How long a claim survives if its holder never releases it
    pub hold: Duration,
    /// How long to keep retrying before giving up
    pub wait: Duration,
    /// Pause between acquisition attempts
    pub retry_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            hold: Duration::from_secs(10),
            wait: Duration::from_secs(10),
            retry_interval: Duration::from_millis(100),
        }
    }
}

/// A held lock. Release it explicitly with [`LockHandle::release`]; a handle
/// dropped without release schedules the release on the current runtime.
pub struct LockHandle {
    store: Arc<dyn CacheStore>,
    key: String,
    token: String,
    released: bool,
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl LockHandle {
    /// Acquires `key`, polling until `options.wait` elapses
    pub async fn acquire(
        store: Arc<dyn CacheStore>,
        key: impl Into<String>,
        options: &LockOptions,
    ) -> Result<Self, DomainError> {
        let key = key.into();
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + options.wait;

        loop {
            if store.try_lock(&key, &token, options.hold).await? {
                debug!(lock = %key, "Lock acquired");

                return Ok(Self {
                    store,
                    key,
                    token,
                    released: false,
                });
            }

            if Instant::now() >= deadline {
                return Err(DomainError::lock_timeout(key));
            }

            tokio::time::sleep(options.retry_interval).await;
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Releases the lock. Returns false if the claim had already expired
    /// or been taken over.
    pub async fn release(mut self) -> Result<bool, DomainError> {
        self.released = true;
        let released = self.store.unlock(&self.key, &self.token).await?;

        if !released {
            warn!(lock = %self.key, "Lock expired before release");
        }

        Ok(released)
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let store = self.store.clone();
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);

        runtime.spawn(async move {
            if let Err(e) = store.unlock(&key, &token).await {
                warn!(lock = %key, error = %e, "Failed to release abandoned lock");
            }
        });
    }
}
