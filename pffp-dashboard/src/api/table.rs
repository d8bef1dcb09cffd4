//! Paginated table cards

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::tables::{build_table, TableKind};
use crate::{ApiResult, AppState};

/// Query parameters for table viewing
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

/// Table data response
#[derive(Debug, Serialize)]
pub struct TableDataResponse {
    pub table_name: String,
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// GET /api/tables/:name
///
/// `name` is one of `farmers`, `plots`, `yearly`, `species`; anything else
/// is 404. Out-of-range pages are clamped.
pub async fn get_table_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Query(query): Query<TableQuery>,
) -> ApiResult<Json<TableDataResponse>> {
    let kind: TableKind = table_name.parse()?;
    let current = state.dashboard.current().await;
    let table = build_table(kind, &current);

    let total_rows = table.rows.len();
    let p = calculate_pagination(total_rows, query.page);
    let rows = table
        .rows
        .into_iter()
        .skip(p.range(total_rows).start)
        .take(PAGE_SIZE)
        .collect();

    Ok(Json(TableDataResponse {
        table_name: kind.as_str().to_string(),
        total_rows,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        columns: table.columns,
        rows,
    }))
}

pub fn table_routes() -> Router<AppState> {
    Router::new().route("/api/tables/:name", get(get_table_data))
}
