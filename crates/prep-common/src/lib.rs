//! Shared utilities for prep-flow crates.
//!
//! This crate provides common utilities used across the workspace,
//! including Polars `AnyValue` helpers and the permissive date parser
//! behind the `Timestamp` type.

pub mod datetime;
pub mod any_value;

// Re-export commonly used functions at crate root for convenience
pub use datetime::{DateParseError, parse_timestamp, timestamp_from_nanos, timestamp_to_nanos};
pub use any_value::{any_to_string, format_numeric, is_missing, parse_f64, parse_i64};
