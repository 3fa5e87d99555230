//! Utility modules shared by the dashboard and the offline tools
//!
//! - Text: order-code normalization, flag parsing, number formatting
//! - LazyFrame helpers: format detection and column validation

pub mod text;
pub mod lazy_helpers;

// Re-export commonly used helpers
pub use text::{format_thousands, normalize_order_code, parse_flag, round_to, title_case};
pub use lazy_helpers::{materialize_with_columns, read_table, require_columns, scan_table, TableFormat};
