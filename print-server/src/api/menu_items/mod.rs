//! Menu item API

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/menu-items",
        get(handler::list).put(handler::upsert),
    )
}
