//! Job title categorization API
//!
//! Maps free-text job titles to the closest service categories by cosine
//! similarity of sentence embeddings, with:
//! - a shared embedding cache guarded by a distributed lock
//! - an atomically swapped category registry refreshed on a schedule
//! - an HTTP surface with API key auth and per-client rate limiting

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use config::CategorySourceKind;
use domain::cache::{CacheStore, LockOptions, QueryKeyScope};
use domain::category::{CategoryRegistry, CategorySource};
use domain::embedding::EmbeddingProvider;
use domain::DomainError;
use infrastructure::cache::{CacheConfig, CacheFactory, CacheType};
use infrastructure::category::{
    PostgresCategoryConfig, PostgresCategorySource, StaticCategorySource,
};
use infrastructure::embedding::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use infrastructure::services::{
    CategorizeConfig, CategorizeService, EmbeddingCache, EmbeddingCacheConfig, RegistryService,
    RegistryServiceConfig,
};
use tracing::info;

/// Create application state from configuration.
///
/// The registry starts empty; callers run the first rebuild themselves.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_cache_store(config).await?;
    let provider = create_embedding_provider(config)?;
    let source = create_category_source(config).await?;

    let embeddings = Arc::new(EmbeddingCache::with_config(
        store.clone(),
        provider,
        EmbeddingCacheConfig::default()
            .with_lock_options(LockOptions {
                hold: Duration::from_secs(config.cache.lock_hold_secs),
                wait: Duration::from_secs(config.cache.lock_wait_secs),
                retry_interval: Duration::from_millis(config.cache.lock_retry_millis),
            })
            .with_probe_timeout(Duration::from_millis(config.cache.probe_timeout_millis)),
    ));

    let registry = Arc::new(CategoryRegistry::new());

    let registry_service = Arc::new(RegistryService::new(
        registry.clone(),
        embeddings.clone(),
        source,
        RegistryServiceConfig {
            embedding_ttl: config.categories.embedding_ttl(),
            concurrency: config.categories.rebuild_concurrency,
        },
    ));

    let categorize_service = Arc::new(CategorizeService::new(
        embeddings,
        registry,
        CategorizeConfig {
            query_ttl: config.cache.query_ttl(),
            scope: QueryKeyScope::from_flag(config.cache.scope_query_keys_by_user),
            top_n: config.categories.top_n,
        },
    ));

    Ok(
        AppState::new(categorize_service, registry_service, store)
            .with_auth(config.auth.clone())
            .with_rate_limit(config.rate_limit.clone()),
    )
}

async fn create_cache_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>, DomainError> {
    let cache_type: CacheType = config.cache.backend.parse()?;

    let cache_config = CacheConfig {
        cache_type: cache_type.clone(),
        redis_url: config.cache.redis_url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        connection_timeout: Duration::from_secs(config.cache.connection_timeout_secs),
        max_capacity: Some(config.cache.max_capacity),
        redis_max_memory: config.cache.redis_max_memory.clone(),
        redis_max_memory_policy: config.cache.redis_max_memory_policy.clone(),
    };

    let store = CacheFactory::new().create(&cache_config).await?;
    info!(backend = %cache_type, "Cache store ready");

    Ok(store)
}

fn create_embedding_provider(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
    let settings = &config.embedding;

    let mut provider_config = OpenAiEmbeddingConfig::new(&settings.base_url)
        .with_model(&settings.model)
        .with_timeout(Duration::from_secs(settings.timeout_secs));

    if let Some(api_key) = &settings.api_key {
        provider_config = provider_config.with_api_key(api_key);
    }

    if let Some(dimensions) = settings.dimensions {
        provider_config = provider_config.with_dimensions(dimensions);
    }

    info!(base_url = %settings.base_url, model = %settings.model, "Embedding provider configured");

    Ok(Arc::new(OpenAiEmbeddingProvider::new(provider_config)?))
}

async fn create_category_source(
    config: &AppConfig,
) -> Result<Arc<dyn CategorySource>, DomainError> {
    let settings = &config.categories;

    match settings.source {
        CategorySourceKind::Static => {
            info!(categories = settings.names.len(), "Using static category source");
            Ok(Arc::new(StaticCategorySource::new(settings.names.iter().cloned())))
        }
        CategorySourceKind::Postgres => {
            let url = settings.database_url.as_deref().ok_or_else(|| {
                DomainError::configuration("categories.database_url is required for the postgres source")
            })?;

            let source = PostgresCategorySource::connect(
                &PostgresCategoryConfig::new(url).with_table(&settings.table),
            )
            .await?;

            info!(table = %settings.table, "Using PostgreSQL category source");
            Ok(Arc::new(source))
        }
    }
}
