//! Job title categorization

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::EmbeddingCache;
use crate::domain::DomainError;
use crate::domain::cache::{EmbeddingKey, QueryKeyScope};
use crate::domain::category::{self, CategoryRegistry};

/// Configuration for categorization
#[derive(Debug, Clone)]
pub struct CategorizeConfig {
    /// TTL for cached query embeddings
    pub query_ttl: Duration,
    /// How query embeddings are keyed
    pub scope: QueryKeyScope,
    /// Number of categories returned per title
    pub top_n: usize,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            query_ttl: Duration::from_secs(3600),
            scope: QueryKeyScope::PerUser,
            top_n: 5,
        }
    }
}

/// Maps job titles to their closest categories
#[derive(Debug)]
pub struct CategorizeService {
    embeddings: Arc<EmbeddingCache>,
    registry: Arc<CategoryRegistry>,
    config: CategorizeConfig,
}

impl CategorizeService {
    pub fn new(
        embeddings: Arc<EmbeddingCache>,
        registry: Arc<CategoryRegistry>,
        config: CategorizeConfig,
    ) -> Self {
        Self {
            embeddings,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &CategorizeConfig {
        &self.config
    }

    /// Returns the configured number of categories closest to `title`, best first
    pub async fn categorize(&self, user_id: i64, title: &str) -> Result<Vec<String>, DomainError> {
        // Fail before paying for an embedding when there is nothing to rank against
        if !self.registry.is_initialized() {
            return Err(DomainError::RegistryNotInitialized);
        }

        let key = EmbeddingKey::query(self.config.scope, user_id, title);
        let embedding = self
            .embeddings
            .get_or_compute(title, Some(&key), self.config.query_ttl)
            .await?;

        let mut ranked = self.top_n(&[embedding], self.config.top_n)?;
        let categories = ranked.pop().unwrap_or_default();

        debug!(user_id, title, categories = ?categories, "Title categorized");

        Ok(categories)
    }

    /// Ranks each query vector against the current registry snapshot
    pub fn top_n(&self, queries: &[Vec<f32>], n: usize) -> Result<Vec<Vec<String>>, DomainError> {
        let snapshot = self.registry.snapshot();
        category::top_n(&snapshot, queries, n)
    }
}
