//! Health check endpoints for Kubernetes probes

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::types::Json;
use serde::Serialize;

use super::state::AppState;

const CACHE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check: the cache store answers and the registry has categories
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let checks = vec![check_cache(&state).await, check_registry(&state)];

    let overall_status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
/// Used for Kubernetes liveness probes to detect crashes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_cache(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    let result = tokio::time::timeout(CACHE_PROBE_TIMEOUT, state.cache_store.ping()).await;
    let message = match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("No answer within {:?}", CACHE_PROBE_TIMEOUT)),
    };

    HealthCheck {
        name: "cache".to_string(),
        status: if message.is_none() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

fn check_registry(state: &AppState) -> HealthCheck {
    let categories = state.registry().snapshot().len();

    if categories == 0 {
        HealthCheck {
            name: "category_registry".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("Category registry not initialized".to_string()),
            latency_ms: None,
        }
    } else {
        HealthCheck {
            name: "category_registry".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} categories", categories)),
            latency_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(!json.contains("checks"));
    }

    #[test]
    fn test_health_response_with_checks() {
        let response = HealthResponse {
            status: HealthStatus::Unhealthy,
            version: "1.0.0".to_string(),
            checks: Some(vec![
                HealthCheck {
                    name: "category_registry".to_string(),
                    status: HealthStatus::Healthy,
                    message: None,
                    latency_ms: Some(5),
                },
                HealthCheck {
                    name: "cache".to_string(),
                    status: HealthStatus::Unhealthy,
                    message: Some("Connection refused".to_string()),
                    latency_ms: Some(100),
                },
            ]),
            latency_ms: Some(105),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"unhealthy\""));
        assert!(json.contains("\"category_registry\""));
        assert!(json.contains("\"cache\""));
        assert!(json.contains("\"Connection refused\""));
    }
}
