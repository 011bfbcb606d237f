//! Utilities
//!
//! - [`logger`] - tracing subscriber setup
//! - [`validation`] - API input checks

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
