//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    LookupOutcome, PrometheusMetrics, create_metrics_router, init_metrics,
    record_embedding_computation, record_embedding_lookup, record_http_request,
    record_rate_limited, record_registry_rebuild,
};
