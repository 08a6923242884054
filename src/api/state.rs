//! Application state for shared services

use std::sync::Arc;

use crate::config::{AuthConfig, RateLimitConfig};
use crate::domain::cache::CacheStore;
use crate::domain::category::CategoryRegistry;
use crate::infrastructure::services::{CategorizeService, RegistryService};

/// Application state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub categorize_service: Arc<CategorizeService>,
    pub registry_service: Arc<RegistryService>,
    pub cache_store: Arc<dyn CacheStore>,
    pub auth: Arc<AuthConfig>,
    pub rate_limit: Arc<RateLimitConfig>,
}

impl AppState {
    pub fn new(
        categorize_service: Arc<CategorizeService>,
        registry_service: Arc<RegistryService>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            categorize_service,
            registry_service,
            cache_store,
            auth: Arc::new(AuthConfig::default()),
            rate_limit: Arc::new(RateLimitConfig::default()),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Arc::new(rate_limit);
        self
    }

    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        self.registry_service.registry()
    }
}
