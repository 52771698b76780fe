//! Static column checks for prep-flow datasets.
//!
//! Each check takes an ordered list of `(column, condition)` pairs and
//! stops at the first violation, reporting the column, the 1-based row
//! number and the offending value. Column-set checks are the exception:
//! they collect every missing or extra name before failing.
//!
//! [`Validator`] bundles the six checks over one frame.

pub mod checks;
mod validator;

pub use checks::category::CategoryCondition;
pub use checks::pattern::RegexCondition;
pub use validator::Validator;

use polars::prelude::Column;
use prep_common::is_missing;
use prep_model::Value;

/// Reads one cell as an owned value. Null, NaN and unreadable cells are
/// all [`Value::Null`].
pub(crate) fn cell(column: &Column, idx: usize) -> Value {
    match column.get(idx) {
        Ok(value) if !is_missing(&value) => Value::from_any(value),
        _ => Value::Null,
    }
}
