//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_amount, format_currency, format_date, format_optional_date, truncate_string};
