//! Infrastructure services

mod categorize_service;
mod embedding_cache;
mod refresh_scheduler;
mod registry_service;

pub use categorize_service::{CategorizeConfig, CategorizeService};
pub use embedding_cache::{EmbeddingCache, EmbeddingCacheConfig};
pub use refresh_scheduler::{RefreshScheduler, RefreshSchedulerConfig};
pub use registry_service::{RegistryService, RegistryServiceConfig};
