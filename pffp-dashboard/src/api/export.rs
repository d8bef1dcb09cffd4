//! Report export endpoint

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::export::{build_workbook, ExportReceipt};
use crate::{ApiError, ApiResult, AppState};

/// POST /api/export
///
/// Writes the filtered farmers, plots and yearly rows plus the species
/// catalog through the configured sink. 503 when no sink is configured.
pub async fn export_report(State(state): State<AppState>) -> ApiResult<Json<ExportReceipt>> {
    let sink = state
        .export_sink
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Export is not configured".to_string()))?;

    let current = state.dashboard.current().await;
    let workbook = build_workbook(&current);

    let receipt = tokio::task::spawn_blocking(move || sink.write(&workbook))
        .await
        .map_err(|e| ApiError::Internal(format!("Export task failed: {}", e)))??;

    info!(
        location = %receipt.location.display(),
        rows = receipt.rows,
        "Report exported"
    );
    Ok(Json(receipt))
}

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/api/export", post(export_report))
}
