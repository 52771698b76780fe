//! Date parseability check for `Timestamp` columns.
//!
//! Missing values are skipped. Values that are already timestamps or
//! numeric (nanoseconds since the epoch) pass. Text goes through the
//! permissive parser: an impossible day is an invalid date, anything
//! else unreadable (including a date too far from the epoch to store) is
//! an invalid date literal.

use polars::prelude::DataFrame;
use prep_common::{DateParseError, parse_timestamp};
use prep_model::{FlowError, Result, Value};

use crate::cell;

/// Checks every column whose condition is `true`.
pub fn check(df: &DataFrame, conditions: &[(String, bool)]) -> Result<()> {
    for (name, is_datetime) in conditions {
        if !*is_datetime {
            continue;
        }
        let column = df.column(name)?;
        for idx in 0..df.height() {
            let value = cell(column, idx);
            if value.is_missing() {
                continue;
            }
            let parsed = match &value {
                Value::Timestamp(_) | Value::Integer(_) => Ok(()),
                Value::Float(f) if f.is_finite() => Ok(()),
                Value::Text(text) => parse_timestamp(text).map(|_| ()),
                other => Err(DateParseError::Unrecognized {
                    value: other.to_text(),
                }),
            };
            match parsed {
                Ok(()) => {}
                Err(DateParseError::DayOutOfRange { .. }) => {
                    return Err(FlowError::InvalidDateFound {
                        column: name.clone(),
                        row_number: idx + 1,
                        value,
                    });
                }
                Err(DateParseError::Unrecognized { .. } | DateParseError::OutOfBounds { .. }) => {
                    return Err(FlowError::InvalidDateLiteralFound {
                        column: name.clone(),
                        row_number: idx + 1,
                        value,
                    });
                }
            }
        }
    }
    Ok(())
}
