//! HTTP API
//!
//! - [`health`] - liveness
//! - [`printers`] - printer administration, test print, online check
//! - [`print_jobs`] - retry sweep, job lookup, print history
//! - [`orders`] - order intake and manual print
//! - [`menu_items`] - menu replica

pub mod health;
pub mod menu_items;
pub mod orders;
pub mod print_jobs;
pub mod printers;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// All routes, no middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(printers::router())
        .merge(print_jobs::router())
        .merge(orders::router())
        .merge(menu_items::router())
}

/// Routes with CORS and request tracing
pub fn build_app() -> Router<ServerState> {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
