//! Health check
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /health | GET | Liveness plus a database read |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    environment: String,
    /// Active printers, if the database answered
    #[serde(skip_serializing_if = "Option::is_none")]
    active_printers: Option<usize>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let active_printers = match state.storage.list_printers() {
        Ok(printers) => Some(printers.iter().filter(|p| p.is_active).count()),
        Err(e) => {
            tracing::error!(error = %e, "Health check database read failed");
            None
        }
    };

    Json(HealthResponse {
        status: if active_printers.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        active_printers,
    })
}
