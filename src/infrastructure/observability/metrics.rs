//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Outcome of an embedding cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served from the store without locking
    Hit,
    /// Another holder computed the value while we waited for the lock
    ContendedHit,
    /// Computed by this caller
    Miss,
}

impl LookupOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::ContendedHit => "contended_hit",
            LookupOutcome::Miss => "miss",
        }
    }
}

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("job_categorizer_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record the outcome of an embedding cache lookup
pub fn record_embedding_lookup(outcome: LookupOutcome) {
    counter!("embedding_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record a provider computation
pub fn record_embedding_computation(provider: &'static str, duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!("embedding_computations_total", "provider" => provider, "status" => status)
        .increment(1);
    histogram!("embedding_computation_duration_seconds", "provider" => provider)
        .record(duration.as_secs_f64());
}

/// Record a registry rebuild
pub fn record_registry_rebuild(success: bool, categories: usize, duration: Duration) {
    let status = if success { "success" } else { "error" };

    counter!("category_registry_rebuilds_total", "status" => status).increment(1);
    histogram!("category_registry_rebuild_duration_seconds").record(duration.as_secs_f64());

    if success {
        gauge!("category_registry_size").set(categories as f64);
    }
}

/// Record a request rejected by the rate limiter
pub fn record_rate_limited() {
    counter!("http_rate_limited_total").increment(1);
}
