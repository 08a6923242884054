//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CacheSettings, CategorySettings, CategorySourceKind, EmbeddingSettings,
    LogFormat, LoggingConfig, MetricsConfig, RateLimitConfig, ServerConfig,
};
