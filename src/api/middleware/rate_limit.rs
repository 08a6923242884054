//! Fixed-window rate limiting backed by the shared cache store

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::observability::record_rate_limited;

const RATE_LIMIT_NAMESPACE: &str = "ratelimit";

/// Limits each client to `rate_limit.requests` per `rate_limit.window_secs`.
///
/// Clients are identified by forwarded or peer address only; credential
/// headers are client-chosen and never select the bucket. A failing store
/// lets the request through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.rate_limit.clone();

    if !config.enabled {
        return next.run(request).await;
    }

    let client = client_identity(&request);
    let key = format!("{}:{}", RATE_LIMIT_NAMESPACE, client);
    let window = Duration::from_secs(config.window_secs);

    match state.cache_store.increment(&key, window).await {
        Ok(count) if count > config.requests => {
            record_rate_limited();
            warn!(client = %client, count, limit = config.requests, "Rate limit exceeded");

            let mut response = ApiError::rate_limited(format!(
                "Rate limit exceeded: {} per {} seconds",
                config.requests, config.window_secs
            ))
            .into_response();

            if let Ok(retry_after) = HeaderValue::from_str(&config.window_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, retry_after);
            }

            response
        }
        Ok(_) => next.run(request).await,
        Err(e) => {
            warn!(error = %e, "Rate limiter unavailable, allowing request");
            next.run(request).await
        }
    }
}

fn client_identity(request: &Request<Body>) -> String {
    if let Some(ip) = forwarded_ip(request.headers()) {
        return format!("ip:{}", ip);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .map(String::from)
}
