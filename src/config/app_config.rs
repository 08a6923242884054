use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub embedding: EmbeddingSettings,
    pub categories: CategorySettings,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cache store and embedding cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    pub backend: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    /// Applied to the Redis server on connect, e.g. "256mb"
    pub redis_max_memory: Option<String>,
    /// Applied to the Redis server on connect, e.g. "volatile-lfu"
    pub redis_max_memory_policy: Option<String>,
    pub connection_timeout_secs: u64,
    pub max_capacity: u64,
    pub lock_hold_secs: u64,
    pub lock_wait_secs: u64,
    pub lock_retry_millis: u64,
    pub probe_timeout_millis: u64,
    pub query_ttl_secs: u64,
    /// Key query embeddings by `{user_id}:{title}` rather than by title alone
    pub scope_query_keys_by_user: bool,
}

/// Embedding server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CategorySourceKind {
    #[default]
    Postgres,
    Static,
}

/// Category source and registry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategorySettings {
    pub source: CategorySourceKind,
    pub database_url: Option<String>,
    pub table: String,
    /// Category names for the static source
    pub names: Vec<String>,
    pub embedding_ttl_secs: u64,
    pub refresh_interval_secs: u64,
    pub rebuild_concurrency: usize,
    pub top_n: usize,
}

/// API key settings; the check is disabled when no key is configured
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub header_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests allowed per client per window
    pub requests: u64,
    pub window_secs: u64,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            redis_url: None,
            key_prefix: None,
            redis_max_memory: None,
            redis_max_memory_policy: None,
            connection_timeout_secs: 5,
            max_capacity: 10_000,
            lock_hold_secs: 10,
            lock_wait_secs: 10,
            lock_retry_millis: 100,
            probe_timeout_millis: 2_000,
            query_ttl_secs: 3_600,
            scope_query_keys_by_user: true,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
            timeout_secs: 30,
            dimensions: None,
        }
    }
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            source: CategorySourceKind::default(),
            database_url: None,
            table: "services_servicetype".to_string(),
            names: Vec::new(),
            embedding_ttl_secs: 14_400,
            refresh_interval_secs: 43_200,
            rebuild_concurrency: 4,
            top_n: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            header_name: "X-API-Key".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: 50,
            window_secs: 60,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl CacheSettings {
    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }
}

impl CategorySettings {
    pub fn embedding_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local`, then `APP__`-prefixed env vars
    pub fn load() -> Result<Self, DomainError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("categories.names")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DomainError::configuration(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| DomainError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the services cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.cache.query_ttl_secs == 0 || self.categories.embedding_ttl_secs == 0 {
            return Err(DomainError::configuration("Embedding TTLs must be positive"));
        }

        if self.cache.lock_hold_secs == 0
            || self.cache.lock_retry_millis == 0
            || self.cache.probe_timeout_millis == 0
        {
            return Err(DomainError::configuration(
                "cache.lock_hold_secs, cache.lock_retry_millis and cache.probe_timeout_millis must be positive",
            ));
        }

        if self.categories.top_n == 0 {
            return Err(DomainError::configuration("categories.top_n must be at least 1"));
        }

        if self.categories.rebuild_concurrency == 0 {
            return Err(DomainError::configuration(
                "categories.rebuild_concurrency must be at least 1",
            ));
        }

        if self.categories.refresh_interval_secs == 0 {
            return Err(DomainError::configuration(
                "categories.refresh_interval_secs must be positive",
            ));
        }

        if self.categories.source == CategorySourceKind::Postgres
            && self.categories.database_url.is_none()
        {
            return Err(DomainError::configuration(
                "categories.database_url is required for the postgres source",
            ));
        }

        if self.rate_limit.enabled && (self.rate_limit.requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(DomainError::configuration(
                "rate_limit.requests and rate_limit.window_secs must be positive",
            ));
        }

        if !self.metrics.path.starts_with('/') {
            return Err(DomainError::configuration("metrics.path must start with '/'"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.categories.source = CategorySourceKind::Static;
        config.categories.names = vec!["Plumbing".to_string()];
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.backend, "in_memory");
        assert_eq!(config.cache.query_ttl(), Duration::from_secs(3600));
        assert!(config.cache.scope_query_keys_by_user);
        assert_eq!(config.categories.embedding_ttl(), Duration::from_secs(14_400));
        assert_eq!(config.categories.refresh_interval(), Duration::from_secs(43_200));
        assert_eq!(config.categories.top_n, 5);
        assert_eq!(config.auth.header_name, "X-API-Key");
        assert_eq!(config.rate_limit.requests, 50);
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_static_config_is_valid() {
        assert!(static_config().validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let config = AppConfig::default();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let mut config = static_config();
        config.categories.top_n = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_lock_timings_rejected() {
        let mut config = static_config();
        config.cache.lock_hold_secs = 0;
        assert!(config.validate().is_err());

        let mut config = static_config();
        config.cache.lock_retry_millis = 0;
        assert!(config.validate().is_err());

        let mut config = static_config();
        config.cache.probe_timeout_millis = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = static_config();
        config.cache.query_ttl_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "logging": { "format": "json" },
            "categories": { "source": "static", "names": ["Chef"] }
        }))
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.categories.source, CategorySourceKind::Static);
        assert_eq!(config.categories.names, vec!["Chef"]);
        assert_eq!(config.categories.top_n, 5);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result: Result<AppConfig, _> = serde_json::from_value(serde_json::json!({
            "categories": { "source": "mongodb" }
        }));

        assert!(result.is_err());
    }
}
