//! Shared types for the kitchen print service
//!
//! Domain models consumed and produced by `print-server`, plus the unified
//! error taxonomy and its HTTP response shape.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
