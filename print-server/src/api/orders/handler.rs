//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{OrderSnapshot, PrintJob};

fn validate_create(payload: &OrderSnapshot) -> AppResult<()> {
    let order = &payload.order;
    validate_required_text(&order.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_required_text(&order.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&order.customer_email, "customer_email", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&order.delivery_address, "delivery_address", MAX_ADDRESS_LEN)?;
    validate_required_text(&order.order_type, "order_type", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&order.location_id, "location_id", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&order.payment_method, "payment_method", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&order.notes, "notes", MAX_NOTE_LEN)?;

    for item in &payload.items {
        if item.order_id != order.id {
            return Err(AppError::validation(format!(
                "item {} belongs to order {}, not {}",
                item.id, item.order_id, order.id
            )));
        }
        if item.quantity <= 0 {
            return Err(AppError::validation(format!(
                "item {} quantity must be positive",
                item.id
            )));
        }
        for custom in &item.customizations {
            validate_required_text(custom, "customization", MAX_NOTE_LEN)?;
        }
    }
    Ok(())
}

/// POST /api/orders - store an order, queueing new ones for auto-print
///
/// Replicating an order that is already stored replaces it without
/// printing again.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderSnapshot>,
) -> AppResult<(StatusCode, Json<OrderSnapshot>)> {
    validate_create(&payload)?;

    let created = state.storage.upsert_order(&payload)?;
    if !created {
        tracing::info!(order_id = payload.order.id, "Order updated");
        return Ok((StatusCode::OK, Json(payload)));
    }

    tracing::info!(order_id = payload.order.id, items = payload.items.len(), "Order received");
    state.enqueue_order(payload.order.id);

    Ok((StatusCode::CREATED, Json(payload)))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderSnapshot>> {
    let snapshot = state
        .storage
        .get_order(id)?
        .ok_or_else(|| AppError::order_not_found(id))?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub printer_id: i64,
}

/// POST /api/orders/{id}/print - print on one printer now
pub async fn print(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PrintRequest>,
) -> AppResult<Json<PrintJob>> {
    Ok(Json(state.service.print_order(id, payload.printer_id).await?))
}
