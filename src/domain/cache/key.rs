//! Cache key generation for embeddings

use std::fmt;

/// Namespace for category embeddings
pub const CATEGORY_NAMESPACE: &str = "category";
/// Namespace for shared (unscoped) query embeddings
pub const QUERY_NAMESPACE: &str = "query";
/// Namespace for computation locks
pub const LOCK_NAMESPACE: &str = "lock";

/// How query embeddings are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKeyScope {
    /// One entry per (user, title): identical titles from different users never share
    #[default]
    PerUser,
    /// One entry per title across all users
    Shared,
}

impl QueryKeyScope {
    pub fn from_flag(scope_by_user: bool) -> Self {
        if scope_by_user {
            Self::PerUser
        } else {
            Self::Shared
        }
    }
}

/// Key under which an embedding is cached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddingKey(String);

impl EmbeddingKey {
    /// Key for a category label, namespaced away from query keys
    pub fn category(name: &str) -> Self {
        Self(format!("{}:{}", CATEGORY_NAMESPACE, name))
    }

    /// Key for a user-submitted title under the given scope
    pub fn query(scope: QueryKeyScope, user_id: i64, title: &str) -> Self {
        match scope {
            QueryKeyScope::PerUser => Self(format!("{}:{}", user_id, title)),
            QueryKeyScope::Shared => Self(format!("{}:{}", QUERY_NAMESPACE, title)),
        }
    }

    /// Caller-supplied key, used verbatim
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of the lock guarding computation of this entry
    pub fn lock_key(&self) -> String {
        format!("{}:{}", LOCK_NAMESPACE, self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbeddingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
