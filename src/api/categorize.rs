//! Job title categorization endpoint

use axum::extract::State;
use tracing::info;

use super::middleware::RequireApiKey;
use super::state::AppState;
use super::types::{ApiError, CategorizeRequest, CategorizeResponse, Json};

/// POST /categorize
pub async fn categorize(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, ApiError> {
    request.validate()?;

    let categories = state
        .categorize_service
        .categorize(request.user_id, &request.title)
        .await?;

    info!(
        user_id = request.user_id,
        matches = categories.len(),
        "Categorized job title"
    );

    Ok(Json(CategorizeResponse {
        user_id: request.user_id,
        title: request.title,
        categories,
    }))
}
