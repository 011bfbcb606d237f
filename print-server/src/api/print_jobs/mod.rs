//! Print job API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/print-jobs/retry", post(handler::retry))
        .route("/api/print-jobs/{id}", get(handler::get_by_id))
        .route("/api/print-history", get(handler::history))
}
