//! Data models
//!
//! Shared between print-server and its API clients.
//! Order and printer ids are `i64`; print job ids are a `u64` sequence.

pub mod order;
pub mod print_job;
pub mod printer;

// Re-exports
pub use order::*;
pub use print_job::*;
pub use printer::*;
