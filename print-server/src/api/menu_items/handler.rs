//! Menu item API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use shared::models::MenuItem;

fn validate_upsert(items: &[MenuItem]) -> AppResult<()> {
    for item in items {
        validate_required_text(&item.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&item.category, "category", MAX_NAME_LEN)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub upserted: usize,
}

/// GET /api/menu-items
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.storage.list_menu_items()?))
}

/// PUT /api/menu-items - bulk insert or replace
pub async fn upsert(
    State(state): State<ServerState>,
    Json(items): Json<Vec<MenuItem>>,
) -> AppResult<Json<UpsertResponse>> {
    validate_upsert(&items)?;
    let upserted = state.storage.upsert_menu_items(&items)?;
    tracing::info!(upserted, "Menu items replicated");
    Ok(Json(UpsertResponse { upserted }))
}
