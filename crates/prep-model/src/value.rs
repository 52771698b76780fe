//! Owned cell values.
//!
//! [`Value`] is the engine's detached view of one table cell. It is what
//! errors carry as the offending value, what category sets hold, and what
//! the per-value cast in [`crate::Dtype::cast`] consumes and produces.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, DataType, NamedFrom, PlSmallStr, PolarsResult, Series, TimeUnit};
use prep_common::{any_to_string, format_numeric, timestamp_from_nanos, timestamp_to_nanos};

use crate::dtype::{CastFailure, Dtype};

/// One cell value, detached from its column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The canonical missing marker.
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns true for `Null` and for a NaN float.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Converts a borrowed polars cell into an owned value.
    pub fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::Boolean(v) => Self::Boolean(v),
            AnyValue::Int8(v) => Self::Integer(i64::from(v)),
            AnyValue::Int16(v) => Self::Integer(i64::from(v)),
            AnyValue::Int32(v) => Self::Integer(i64::from(v)),
            AnyValue::Int64(v) => Self::Integer(v),
            AnyValue::UInt8(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt16(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt32(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt64(v) => match i64::try_from(v) {
                Ok(v) => Self::Integer(v),
                Err(_) => Self::Float(v as f64),
            },
            AnyValue::Float32(v) => Self::Float(f64::from(v)),
            AnyValue::Float64(v) => Self::Float(v),
            AnyValue::String(s) => Self::Text(s.to_string()),
            AnyValue::StringOwned(s) => Self::Text(s.to_string()),
            AnyValue::Datetime(v, unit, _) => Self::Timestamp(timestamp_from_nanos(to_nanos(v, unit))),
            AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .map_or(Self::Null, |date| Self::Timestamp(date.and_time(chrono::NaiveTime::MIN))),
            other => Self::Text(any_to_string(other)),
        }
    }

    /// The canonical text form: what a `Text` cast produces and what the
    /// regex check matches against. Missing values render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Boolean(v) => v.to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => format_numeric(*v),
            Self::Text(s) => s.clone(),
            Self::Timestamp(ts) => ts.to_string(),
        }
    }

    /// The numeric view of a value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Category-membership equality.
    ///
    /// Two values match when they are equal, when both are numeric and
    /// numerically equal, or when one is text whose trimmed form equals the
    /// other's canonical text form. This lets `category = [0, 1]` accept the
    /// raw text `"0"` before casting as well as the integer `0` after it.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a == b;
        }
        match (self, other) {
            (Self::Text(text), value) | (value, Self::Text(text)) if !value.is_missing() => {
                text.trim() == value.to_text()
            }
            _ => false,
        }
    }

    /// The type a value naturally belongs to.
    pub fn dtype(&self) -> Option<Dtype> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(Dtype::Boolean),
            Self::Integer(_) => Some(Dtype::Integer),
            Self::Float(_) => Some(Dtype::Float),
            Self::Text(_) => Some(Dtype::Text),
            Self::Timestamp(_) => Some(Dtype::Timestamp),
        }
    }
}

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn to_nanos(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value,
        TimeUnit::Microseconds => value.saturating_mul(1_000),
        TimeUnit::Milliseconds => value.saturating_mul(1_000_000),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{s:?}"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Reads every cell of a series as owned values.
pub fn series_values(series: &Series) -> PolarsResult<Vec<Value>> {
    let mut values = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        values.push(Value::from_any(series.get(idx)?));
    }
    Ok(values)
}

/// Builds a series of the given type from values that already have that type.
///
/// Missing values become nulls. A value of another kind is run through
/// [`Dtype::cast`] first, and the first value that cannot be stored is
/// returned as the error.
pub fn values_to_series(name: &str, dtype: Dtype, values: &[Value]) -> Result<Series, CastFailure> {
    let coerced = values
        .iter()
        .map(|value| {
            if value.is_missing() {
                Ok(Value::Null)
            } else if value.dtype() == Some(dtype) {
                Ok(value.clone())
            } else {
                dtype.cast(value)
            }
        })
        .collect::<Result<Vec<Value>, CastFailure>>()?;
    let name = PlSmallStr::from(name);
    let series = match dtype {
        Dtype::Text => {
            let cells: Vec<Option<String>> = coerced
                .into_iter()
                .map(|v| match v {
                    Value::Text(s) => Some(s),
                    _ => None,
                })
                .collect();
            Series::new(name, cells)
        }
        Dtype::Integer => {
            let cells: Vec<Option<i64>> = coerced
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i),
                    _ => None,
                })
                .collect();
            Series::new(name, cells)
        }
        Dtype::Float => {
            let cells: Vec<Option<f64>> = coerced
                .into_iter()
                .map(|v| match v {
                    Value::Float(f) => Some(f),
                    _ => None,
                })
                .collect();
            Series::new(name, cells)
        }
        Dtype::Boolean => {
            let cells: Vec<Option<bool>> = coerced
                .into_iter()
                .map(|v| match v {
                    Value::Boolean(b) => Some(b),
                    _ => None,
                })
                .collect();
            Series::new(name, cells)
        }
        Dtype::Timestamp => {
            let mut cells: Vec<Option<i64>> = Vec::with_capacity(coerced.len());
            for value in coerced {
                match value {
                    Value::Timestamp(ts) => {
                        let nanos = timestamp_to_nanos(&ts).ok_or(CastFailure {
                            value: Value::Timestamp(ts),
                            to: dtype,
                        })?;
                        cells.push(Some(nanos));
                    }
                    _ => cells.push(None),
                }
            }
            let nanos = Series::new(name, cells);
            // Int64 -> Datetime(ns) reinterprets the integers as nanoseconds.
            nanos
                .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))
                .unwrap_or(nanos)
        }
    };
    Ok(series)
}

/// Builds a series from values of any kind, inferring the column type.
///
/// The first non-missing value decides the type; when later values disagree
/// (other than integers mixed into a float column) the series falls back to
/// text. An all-missing input becomes a text series of nulls.
pub fn series_from_values(name: &str, values: &[Value]) -> Result<Series, CastFailure> {
    let mut inferred: Option<Dtype> = None;
    for value in values.iter().filter(|v| !v.is_missing()) {
        let Some(kind) = value.dtype() else { continue };
        inferred = match (inferred, kind) {
            (None, kind) => Some(kind),
            (Some(current), kind) if current == kind => Some(current),
            (Some(Dtype::Float), Dtype::Integer) | (Some(Dtype::Integer), Dtype::Float) => {
                Some(Dtype::Float)
            }
            _ => Some(Dtype::Text),
        };
    }
    values_to_series(name, inferred.unwrap_or(Dtype::Text), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values() {
        assert!(Value::Null.is_missing());
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(!Value::Text(String::new()).is_missing());
    }

    #[test]
    fn from_any_covers_scalars() {
        assert_eq!(Value::from_any(AnyValue::Int32(7)), Value::Integer(7));
        assert_eq!(Value::from_any(AnyValue::String("x")), Value::from("x"));
        assert_eq!(Value::from_any(AnyValue::Boolean(true)), Value::Boolean(true));
        assert_eq!(Value::from_any(AnyValue::Null), Value::Null);
    }

    #[test]
    fn from_any_reads_dates() {
        let value = Value::from_any(AnyValue::Date(1));
        assert_eq!(value.to_text(), "1970-01-02 00:00:00");
    }

    #[test]
    fn loose_equality_for_categories() {
        assert!(Value::from("0").loosely_eq(&Value::Integer(0)));
        assert!(Value::Integer(1).loosely_eq(&Value::Float(1.0)));
        assert!(Value::from("man").loosely_eq(&Value::from("man")));
        assert!(!Value::from("男").loosely_eq(&Value::from("man")));
        assert!(!Value::Null.loosely_eq(&Value::from("")));
    }

    #[test]
    fn display_quotes_text() {
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(2.0).to_string(), "2");
    }

    #[test]
    fn infers_series_types() {
        let series =
            series_from_values("n", &[Value::Integer(1), Value::Null, Value::Float(2.5)]).unwrap();
        assert_eq!(series.dtype(), &DataType::Float64);
        assert_eq!(series.null_count(), 1);

        let series = series_from_values("t", &[Value::from("a"), Value::Integer(1)]).unwrap();
        assert_eq!(series.dtype(), &DataType::String);
    }

    #[test]
    fn builds_timestamp_series() {
        let ts = prep_common::parse_timestamp("1995-10-19").unwrap();
        let series =
            values_to_series("ts", Dtype::Timestamp, &[Value::Timestamp(ts), Value::Null]).unwrap();
        assert_eq!(
            series.dtype(),
            &DataType::Datetime(TimeUnit::Nanoseconds, None)
        );
        assert_eq!(series_values(&series).unwrap(), vec![Value::Timestamp(ts), Value::Null]);
    }

    #[test]
    fn unrepresentable_timestamps_are_rejected() {
        let far = chrono::NaiveDate::from_ymd_opt(2300, 1, 1)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN);
        let err = values_to_series("ts", Dtype::Timestamp, &[Value::Timestamp(far)]).unwrap_err();
        assert_eq!(err.value, Value::Timestamp(far));
        assert_eq!(err.to, Dtype::Timestamp);
    }
}
