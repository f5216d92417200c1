//! Shared utilities

pub mod error;
pub mod format;

pub use error::{AppError, AppResult, ErrorResponse};
pub use format::{format_bytes, format_uptime};
