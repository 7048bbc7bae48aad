//! Mastery record endpoints

use axum::{extract::State, Json};
use wordmatch_core::MasteryStore;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/mastery
pub async fn list(State(state): State<AppState>) -> Result<Json<MasteryListResponse>> {
    let records = state.store.list_all()?;
    let count = state.store.count()?;
    Ok(Json(MasteryListResponse {
        records,
        count,
        graduation_threshold: state.settings.graduation_threshold,
    }))
}
