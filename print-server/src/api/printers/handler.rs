//! Printer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use shared::models::{Printer, PrinterCreate, PrinterPurpose, PrinterUpdate, TestPrintResult};

fn validate_create(payload: &PrinterCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.location_id, "location_id", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.ip_address, "ip_address", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.device_path, "device_path", MAX_ADDRESS_LEN)?;
    Ok(())
}

fn validate_update(payload: &PrinterUpdate) -> AppResult<()> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(location_id) = &payload.location_id {
        validate_required_text(location_id, "location_id", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_text(&payload.ip_address, "ip_address", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.device_path, "device_path", MAX_ADDRESS_LEN)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only active printers at this location
    pub location_id: Option<String>,
    pub purpose: Option<PrinterPurpose>,
}

/// GET /api/printers
///
/// Without `location_id` every printer is returned, active or not.
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Printer>>> {
    let printers = match query.location_id.as_deref() {
        Some(location_id) => state.registry().active_printers(location_id, query.purpose)?,
        None => state
            .registry()
            .list()?
            .into_iter()
            .filter(|p| query.purpose.is_none_or(|purpose| p.purpose == purpose))
            .collect(),
    };
    Ok(Json(printers))
}

/// GET /api/printers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Printer>> {
    Ok(Json(state.registry().get(id)?))
}

/// POST /api/printers
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PrinterCreate>,
) -> AppResult<(StatusCode, Json<Printer>)> {
    validate_create(&payload)?;
    let printer = state.registry().create(payload)?;
    Ok((StatusCode::CREATED, Json(printer)))
}

/// PUT /api/printers/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PrinterUpdate>,
) -> AppResult<Json<Printer>> {
    validate_update(&payload)?;
    Ok(Json(state.registry().update(id, payload)?))
}

/// DELETE /api/printers/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.registry().delete(id)?;
    Ok(Json(true))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// PUT /api/printers/{id}/active
pub async fn set_active(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> AppResult<Json<Printer>> {
    Ok(Json(state.registry().set_active(id, payload.is_active)?))
}

/// POST /api/printers/{id}/test
///
/// A failed print is reported in the body, not as an HTTP error.
pub async fn test_print(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TestPrintResult>> {
    Ok(Json(state.service.test_print(id).await?))
}

#[derive(Debug, Serialize)]
pub struct OnlineResponse {
    pub printer_id: i64,
    pub online: bool,
}

/// GET /api/printers/{id}/online
pub async fn online(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OnlineResponse>> {
    let printer = state.registry().get(id)?;
    let online = state.service.dispatcher().is_online(&printer).await;
    Ok(Json(OnlineResponse {
        printer_id: id,
        online,
    }))
}
