//! Print job API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::history_limit;
use shared::models::{PrintJob, PrintJobRecord, RetrySummary};

/// POST /api/print-jobs/retry - run one retry sweep now
pub async fn retry(State(state): State<ServerState>) -> AppResult<Json<RetrySummary>> {
    Ok(Json(state.retry.retry_failed_jobs().await?))
}

/// GET /api/print-jobs/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<PrintJob>> {
    Ok(Json(state.service.get_job(id)?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub order_id: Option<i64>,
    /// Default 50, max 500
    pub limit: Option<usize>,
}

/// GET /api/print-history - newest first
pub async fn history(
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<PrintJobRecord>>> {
    let limit = history_limit(query.limit);
    Ok(Json(state.service.history(query.order_id, limit)?))
}
