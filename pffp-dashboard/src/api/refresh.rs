//! Manual data refresh

use axum::{extract::State, routing::post, Json, Router};

use crate::store::RefreshSummary;
use crate::{ApiError, ApiResult, AppState};

/// POST /api/refresh
///
/// Refetches all collections and resets the filters. Returns 409 while
/// another fetch is outstanding and 502 when the fetch fails (the previous
/// data stays in place).
pub async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshSummary>> {
    // Runs detached so a dropped connection cannot abandon the fetch halfway
    let dashboard = state.dashboard.clone();
    let summary = tokio::spawn(async move { dashboard.refresh().await })
        .await
        .map_err(|e| ApiError::Internal(format!("Refresh task failed: {}", e)))??;

    Ok(Json(summary))
}

pub fn refresh_routes() -> Router<AppState> {
    Router::new().route("/api/refresh", post(refresh))
}
