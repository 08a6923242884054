//! Cache domain - shared store abstraction, keys, locking and value encoding

mod codec;
mod key;
mod lock;
mod store;

pub use codec::{decode_vector, encode_vector};
pub use key::{EmbeddingKey, QueryKeyScope, CATEGORY_NAMESPACE, LOCK_NAMESPACE, QUERY_NAMESPACE};
pub use lock::{LockHandle, LockOptions};
pub use store::CacheStore;

#[cfg(test)]
pub use store::mock::MockCacheStore;
