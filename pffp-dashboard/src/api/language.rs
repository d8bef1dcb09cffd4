//! Display language endpoints
//!
//! Switching language only changes how labels resolve; it never refetches.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use pffp_common::Language;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageBody {
    pub language: Language,
}

/// GET /api/language
pub async fn get_language(State(state): State<AppState>) -> Json<LanguageBody> {
    Json(LanguageBody {
        language: state.dashboard.language().await,
    })
}

/// PUT /api/language
pub async fn set_language(
    State(state): State<AppState>,
    Json(body): Json<LanguageBody>,
) -> Json<LanguageBody> {
    let language = state.dashboard.set_language(body.language).await;
    Json(LanguageBody { language })
}

/// POST /api/language/toggle
pub async fn toggle_language(State(state): State<AppState>) -> Json<LanguageBody> {
    Json(LanguageBody {
        language: state.dashboard.toggle_language().await,
    })
}

pub fn language_routes() -> Router<AppState> {
    Router::new()
        .route("/api/language", get(get_language).put(set_language))
        .route("/api/language/toggle", post(toggle_language))
}
