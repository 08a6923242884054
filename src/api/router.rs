use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::categorize;
use super::health;
use super::middleware::{logging_middleware, rate_limit_middleware, security_headers_middleware};
use super::state::AppState;
use super::types::{ApiError, Json};

#[derive(Serialize)]
struct WelcomeResponse {
    message: &'static str,
    version: &'static str,
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Job Title Categorization API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(api_key_header: &str) -> CorsLayer {
    let mut allowed_headers = vec![header::AUTHORIZATION, header::CONTENT_TYPE];

    if let Ok(name) = HeaderName::from_bytes(api_key_header.as_bytes()) {
        allowed_headers.push(name);
    }

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers)
}

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let categorize_routes = Router::new()
        .route("/categorize", post(categorize::categorize))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/", get(welcome))
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(categorize_routes)
        .fallback(not_found)
        .layer(cors_layer(&state.auth.header_name))
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
