//! Column-level transformations for prep-flow datasets.
//!
//! - [`cast`]: two-step casting of a column to a declared [`prep_model::Dtype`]
//! - [`merge`]: projected joins that pull reference columns in
//! - [`shape`]: renaming, broadcasting hook results, NaN normalization
//!   and final column ordering

pub mod cast;
pub mod merge;
pub mod shape;

pub use cast::{cast_column, cast_series, has_missing};
pub use merge::{MergeSpec, merge};
pub use shape::{
    broadcast_value, fit_to_height, normalize_missing, rename_columns, reorder_columns,
};
