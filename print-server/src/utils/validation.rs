//! Input validation helpers
//!
//! Length limits for the text fields accepted by the HTTP API. An 80mm
//! ticket line holds 48 characters; longer values wrap.

use shared::error::AppError;

/// Printer names, customer names, menu item names
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, location id, order type, payment method
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Order notes and customizations
pub const MAX_NOTE_LEN: usize = 500;

/// Delivery addresses, device paths
pub const MAX_ADDRESS_LEN: usize = 500;

/// Print history page size
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Clamp a requested history page size; zero means the default
pub fn history_limit(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_HISTORY_LIMIT,
        Some(limit) => limit.min(MAX_HISTORY_LIMIT),
    }
}
