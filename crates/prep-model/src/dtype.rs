//! The type registry.
//!
//! Every type a column may declare is a [`Dtype`]. Each one carries a
//! display name (matching polars' short type names), the polars
//! [`DataType`] its columns hold after casting, and a per-value cast rule.

use std::fmt;
use std::str::FromStr;

use polars::prelude::{DataType, TimeUnit};
use prep_common::{parse_f64, parse_i64, parse_timestamp, timestamp_from_nanos, timestamp_to_nanos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// A declarable column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

/// A single value that could not be converted to a [`Dtype`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot cast {value} to {to}")]
pub struct CastFailure {
    pub value: Value,
    pub to: Dtype,
}

/// Returned by [`Dtype::from_str`] for names outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type name '{0}'")]
pub struct UnknownDtype(pub String);

impl Dtype {
    /// Every registered type, in display order.
    pub const ALL: [Dtype; 5] = [
        Dtype::Text,
        Dtype::Integer,
        Dtype::Float,
        Dtype::Boolean,
        Dtype::Timestamp,
    ];

    /// Short display name used in cast errors.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Text => "str",
            Dtype::Integer => "i64",
            Dtype::Float => "f64",
            Dtype::Boolean => "bool",
            Dtype::Timestamp => "datetime[ns]",
        }
    }

    /// Alternative spellings accepted by [`FromStr`].
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Dtype::Text => &["str", "text", "string", "utf8"],
            Dtype::Integer => &["i64", "int", "integer", "int64"],
            Dtype::Float => &["f64", "float", "float64", "double"],
            Dtype::Boolean => &["bool", "boolean"],
            Dtype::Timestamp => &["datetime[ns]", "datetime", "timestamp", "date"],
        }
    }

    /// The polars column type values of this type are stored as.
    pub fn data_type(self) -> DataType {
        match self {
            Dtype::Text => DataType::String,
            Dtype::Integer => DataType::Int64,
            Dtype::Float => DataType::Float64,
            Dtype::Boolean => DataType::Boolean,
            Dtype::Timestamp => DataType::Datetime(TimeUnit::Nanoseconds, None),
        }
    }

    /// Whether a polars column already holds this type.
    pub fn matches(self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Dtype::Timestamp, DataType::Datetime(_, _)) => true,
            (dtype, other) => &dtype.data_type() == other,
        }
    }

    /// Converts one value to this type.
    ///
    /// Missing values pass through as [`Value::Null`]. Text is trimmed before
    /// numeric parsing. Floats truncate toward zero when cast to integers.
    /// Booleans become 0/1 numerically; any value's truthiness is its boolean.
    /// Integers cast to timestamps are nanoseconds since the Unix epoch, and
    /// a timestamp outside the nanosecond range does not cast.
    pub fn cast(self, value: &Value) -> Result<Value, CastFailure> {
        if value.is_missing() {
            return Ok(Value::Null);
        }
        let fail = || CastFailure {
            value: value.clone(),
            to: self,
        };
        match self {
            Dtype::Text => Ok(Value::Text(value.to_text())),
            Dtype::Integer => match value {
                Value::Integer(v) => Ok(Value::Integer(*v)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                Value::Float(f) => truncate(*f).map(Value::Integer).ok_or_else(fail),
                Value::Text(s) => parse_i64(s).map(Value::Integer).ok_or_else(fail),
                _ => Err(fail()),
            },
            Dtype::Float => match value {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Integer(v) => Ok(Value::Float(*v as f64)),
                Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::Text(s) => parse_f64(s).map(Value::Float).ok_or_else(fail),
                _ => Err(fail()),
            },
            Dtype::Boolean => Ok(Value::Boolean(truthy(value))),
            Dtype::Timestamp => match value {
                Value::Timestamp(ts) => timestamp_to_nanos(ts)
                    .map(|_| Value::Timestamp(*ts))
                    .ok_or_else(fail),
                Value::Integer(v) => Ok(Value::Timestamp(timestamp_from_nanos(*v))),
                Value::Float(f) => truncate(*f)
                    .map(|n| Value::Timestamp(timestamp_from_nanos(n)))
                    .ok_or_else(fail),
                Value::Text(s) => parse_timestamp(s)
                    .map(Value::Timestamp)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
        }
    }
}

fn truncate(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Integer(v) => *v != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::Text(s) => !s.is_empty(),
        Value::Timestamp(_) => true,
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dtype {
    type Err = UnknownDtype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Dtype::ALL
            .into_iter()
            .find(|dtype| dtype.aliases().contains(&needle.as_str()))
            .ok_or_else(|| UnknownDtype(s.to_string()))
    }
}
