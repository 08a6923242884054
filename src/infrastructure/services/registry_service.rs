//! Category registry rebuilds

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Mutex;
use tracing::{error, info};

use super::EmbeddingCache;
use crate::domain::DomainError;
use crate::domain::cache::EmbeddingKey;
use crate::domain::category::{
    CategoryEntry, CategoryRegistry, CategorySource, RegistrySnapshot,
};
use crate::domain::embedding::is_finite;
use crate::infrastructure::observability::record_registry_rebuild;

/// Configuration for registry rebuilds
#[derive(Debug, Clone)]
pub struct RegistryServiceConfig {
    /// TTL for cached category embeddings
    pub embedding_ttl: Duration,
    /// Maximum category embeddings resolved at once
    pub concurrency: usize,
}

impl Default for RegistryServiceConfig {
    fn default() -> Self {
        Self {
            embedding_ttl: Duration::from_secs(14_400),
            concurrency: 4,
        }
    }
}

/// Rebuilds the category registry from the category source
pub struct RegistryService {
    registry: Arc<CategoryRegistry>,
    embeddings: Arc<EmbeddingCache>,
    source: Arc<dyn CategorySource>,
    config: RegistryServiceConfig,
    rebuilding: Mutex<()>,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

impl RegistryService {
    pub fn new(
        registry: Arc<CategoryRegistry>,
        embeddings: Arc<EmbeddingCache>,
        source: Arc<dyn CategorySource>,
        config: RegistryServiceConfig,
    ) -> Self {
        Self {
            registry,
            embeddings,
            source,
            config,
            rebuilding: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        &self.registry
    }

    /// Lists categories from the source and rebuilds with the configured TTL.
    /// Returns the number of categories now served.
    pub async fn refresh(&self) -> Result<usize, DomainError> {
        let records = self.source.list_categories().await?;
        let names: Vec<String> = records.into_iter().map(|r| r.name).collect();

        self.rebuild(&names, self.config.embedding_ttl).await
    }

    /// Embeds every name and atomically installs the resulting snapshot.
    ///
    /// On any failure the previously installed snapshot keeps serving.
    pub async fn rebuild(&self, names: &[String], ttl: Duration) -> Result<usize, DomainError> {
        let _guard = self.rebuilding.lock().await;
        let start = Instant::now();

        let result = self.build_snapshot(names, ttl).await;
        let elapsed = start.elapsed();

        match result {
            Ok(snapshot) => {
                let size = snapshot.len();
                let previous = self.registry.replace(snapshot);

                record_registry_rebuild(true, size, elapsed);
                info!(
                    categories = size,
                    previous = previous.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Category registry rebuilt"
                );

                Ok(size)
            }
            Err(e) => {
                record_registry_rebuild(false, 0, elapsed);
                error!(
                    error = %e,
                    serving = self.registry.snapshot().len(),
                    "Category registry rebuild failed, keeping previous snapshot"
                );

                Err(e)
            }
        }
    }

    async fn build_snapshot(
        &self,
        names: &[String],
        ttl: Duration,
    ) -> Result<RegistrySnapshot, DomainError> {
        let names = dedup_names(names);

        if names.is_empty() {
            return Err(DomainError::EmptyRegistry);
        }

        let embeddings = &self.embeddings;

        let entries: Vec<CategoryEntry> = stream::iter(names)
            .map(|name| async move {
                let key = EmbeddingKey::category(&name);

                embeddings
                    .get_or_compute(&name, Some(&key), ttl)
                    .await
                    .map(|embedding| CategoryEntry::new(name.clone(), embedding))
                    .map_err(|e| DomainError::rebuild_failed(name.as_str(), e.to_string()))
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        validate_rows(&entries)?;

        let first = entries[0].name.clone();
        RegistrySnapshot::from_entries(entries)
            .map_err(|e| DomainError::rebuild_failed(first, e.to_string()))
    }
}

/// Drops repeated names, keeping each at its first position
fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());

    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Attributes shape problems to the offending category
fn validate_rows(entries: &[CategoryEntry]) -> Result<(), DomainError> {
    let Some(first) = entries.first() else {
        return Err(DomainError::EmptyRegistry);
    };
    let dimensions = first.embedding.len();

    for entry in entries {
        if entry.embedding.len() != dimensions {
            return Err(DomainError::rebuild_failed(
                entry.name.as_str(),
                DomainError::dimension_mismatch(dimensions, entry.embedding.len()).to_string(),
            ));
        }

        if !is_finite(&entry.embedding) {
            return Err(DomainError::rebuild_failed(
                entry.name.as_str(),
                "embedding has non-finite components",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheStore;
    use crate::domain::category::{CategoryRecord, MockCategorySource};
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::category::StaticCategorySource;

    const TTL: Duration = Duration::from_secs(14_400);

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn service_with(
        provider: Arc<MockEmbeddingProvider>,
        source: Arc<dyn CategorySource>,
    ) -> (RegistryService, Arc<dyn CacheStore>) {
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
        let embeddings = Arc::new(EmbeddingCache::new(store.clone(), provider));
        let service = RegistryService::new(
            Arc::new(CategoryRegistry::new()),
            embeddings,
            source,
            RegistryServiceConfig::default(),
        );

        (service, store)
    }

    fn service(provider: Arc<MockEmbeddingProvider>) -> (RegistryService, Arc<dyn CacheStore>) {
        service_with(provider, Arc::new(StaticCategorySource::default()))
    }

    #[tokio::test]
    async fn test_rebuild_installs_snapshot_in_order() {
        let (service, store) = service(Arc::new(MockEmbeddingProvider::new(8)));

        let size = service
            .rebuild(&names(&["Plumbing", "Electrical", "Carpentry"]), TTL)
            .await
            .unwrap();

        assert_eq!(size, 3);
        let snapshot = service.registry().snapshot();
        assert_eq!(snapshot.names(), &["Plumbing", "Electrical", "Carpentry"]);
        assert!(store.get("category:Plumbing").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rebuild_collapses_duplicates() {
        let provider = Arc::new(MockEmbeddingProvider::new(8));
        let (service, _) = service(provider.clone());

        service
            .rebuild(&names(&["Plumbing", "Electrical", "Plumbing"]), TTL)
            .await
            .unwrap();

        assert_eq!(service.registry().snapshot().names(), &["Plumbing", "Electrical"]);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_rebuild_empty_names() {
        let (service, _) = service(Arc::new(MockEmbeddingProvider::new(8)));

        let err = service.rebuild(&[], TTL).await.unwrap_err();

        assert!(matches!(err, DomainError::EmptyRegistry));
        assert!(!service.registry().is_initialized());
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let provider = Arc::new(MockEmbeddingProvider::new(8));
        let (service, _) = service(provider.clone());

        service
            .rebuild(&names(&["Plumbing", "Electrical"]), TTL)
            .await
            .unwrap();
        let before = service.registry().snapshot();

        provider.fail_on("Welding");
        let err = service
            .rebuild(&names(&["Plumbing", "Welding", "Electrical"]), TTL)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::RegistryRebuildFailed { ref category, .. } if category == "Welding"
        ));
        let after = service.registry().snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.names(), &["Plumbing", "Electrical"]);
    }

    #[tokio::test]
    async fn test_mixed_dimensions_rejected() {
        let provider = Arc::new(
            MockEmbeddingProvider::new(3)
                .with_vector("Plumbing", vec![1.0, 0.0, 0.0])
                .with_vector("Electrical", vec![1.0, 0.0]),
        );
        let (service, _) = service(provider);

        let err = service
            .rebuild(&names(&["Plumbing", "Electrical"]), TTL)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::RegistryRebuildFailed { ref category, .. } if category == "Electrical"
        ));
    }

    #[tokio::test]
    async fn test_non_finite_embedding_rejected() {
        let provider = Arc::new(
            MockEmbeddingProvider::new(2).with_vector("Plumbing", vec![f32::NAN, 0.0]),
        );
        let (service, _) = service(provider);

        let err = service
            .rebuild(&names(&["Plumbing"]), TTL)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::RegistryRebuildFailed { .. }));
    }

    #[tokio::test]
    async fn test_rebuild_reuses_cached_category_embeddings() {
        let provider = Arc::new(MockEmbeddingProvider::new(8));
        let (service, _) = service(provider.clone());
        let list = names(&["Plumbing", "Electrical"]);

        service.rebuild(&list, TTL).await.unwrap();
        service.rebuild(&list, TTL).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_reads_source() {
        let mut source = MockCategorySource::new();
        source.expect_list_categories().times(1).returning(|| {
            Ok(vec![
                CategoryRecord::new("Cleaning"),
                CategoryRecord::new("Gardening"),
            ])
        });
        let (service, _) =
            service_with(Arc::new(MockEmbeddingProvider::new(8)), Arc::new(source));

        let size = service.refresh().await.unwrap();

        assert_eq!(size, 2);
        assert_eq!(service.registry().snapshot().names(), &["Cleaning", "Gardening"]);
    }

    #[tokio::test]
    async fn test_refresh_source_failure() {
        let mut source = MockCategorySource::new();
        source
            .expect_list_categories()
            .returning(|| Err(DomainError::storage("connection refused")));
        let (service, _) =
            service_with(Arc::new(MockEmbeddingProvider::new(8)), Arc::new(source));

        let err = service.refresh().await.unwrap_err();

        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[test]
    fn test_dedup_names_keeps_first_position() {
        let deduped = dedup_names(&names(&["b", "a", "b", "c", "a"]));
        assert_eq!(deduped, names(&["b", "a", "c"]));
    }
}
