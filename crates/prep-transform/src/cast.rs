//! Casting columns to declared types.
//!
//! A cast runs in two steps. The bulk step converts the whole column at
//! once and is skipped when the column holds any missing value; when it
//! fails the error names only the column ([`FlowError::ColumnCast`]). The
//! per-value step then converts whatever is left cell by cell, keeping
//! missing values, and reports the first failing row
//! ([`FlowError::ValueCast`]).

use polars::prelude::{DataFrame, DataType, Series};
use prep_model::{Dtype, FlowError, Result, Value, series_values, values_to_series};

/// Returns true if the series holds a null or a NaN.
pub fn has_missing(series: &Series) -> bool {
    if series.null_count() > 0 {
        return true;
    }
    match series.dtype() {
        DataType::Float64 => series
            .f64()
            .is_ok_and(|ca| ca.into_iter().any(|v| v.is_some_and(f64::is_nan))),
        DataType::Float32 => series
            .f32()
            .is_ok_and(|ca| ca.into_iter().any(|v| v.is_some_and(f32::is_nan))),
        _ => false,
    }
}

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Casts a series to `dtype`, keeping its name.
pub fn cast_series(series: &Series, dtype: Dtype) -> Result<Series> {
    if series.dtype() == &dtype.data_type() {
        return Ok(series.clone());
    }

    let staged = if has_missing(series) {
        series.clone()
    } else {
        bulk_cast(series, dtype).ok_or_else(|| {
            FlowError::column_cast(series.name(), &series.dtype().to_string(), dtype)
        })?
    };

    cast_values(&staged, dtype)
}

/// Casts the named column of `df` in place.
pub fn cast_column(df: &mut DataFrame, name: &str, dtype: Dtype) -> Result<()> {
    let series = df.column(name)?.as_materialized_series().clone();
    let cast = cast_series(&series, dtype)?;
    tracing::trace!(column = name, from = %series.dtype(), to = dtype.name(), "cast column");
    df.with_column(cast)?;
    Ok(())
}

fn bulk_cast(series: &Series, dtype: Dtype) -> Option<Series> {
    if is_numeric(series.dtype()) && matches!(dtype, Dtype::Integer | Dtype::Float) {
        return series.strict_cast(&dtype.data_type()).ok();
    }
    let values = series_values(series).ok()?;
    let cast = values
        .iter()
        .map(|value| dtype.cast(value))
        .collect::<std::result::Result<Vec<Value>, _>>()
        .ok()?;
    values_to_series(series.name(), dtype, &cast).ok()
}

fn cast_values(series: &Series, dtype: Dtype) -> Result<Series> {
    if series.dtype() == &dtype.data_type() {
        return Ok(series.clone());
    }
    let from = series.dtype().to_string();
    let mut cast = Vec::with_capacity(series.len());
    for (idx, value) in series_values(series)?.into_iter().enumerate() {
        if value.is_missing() {
            cast.push(Value::Null);
            continue;
        }
        match dtype.cast(&value) {
            Ok(converted) => cast.push(converted),
            Err(_) => {
                return Err(FlowError::ValueCast {
                    column: series.name().to_string(),
                    row_number: idx + 1,
                    value,
                    from,
                    to: dtype.name().to_string(),
                });
            }
        }
    }
    values_to_series(series.name(), dtype, &cast)
        .map_err(|_| FlowError::column_cast(series.name(), &from, dtype))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, TimeUnit};

    #[test]
    fn keeps_missing_values() {
        let series = Series::new("age".into(), vec![Some("28"), None]);
        let cast = cast_series(&series, Dtype::Integer).unwrap();
        assert_eq!(cast.dtype(), &DataType::Int64);
        assert_eq!(cast.i64().unwrap().get(0), Some(28));
        assert_eq!(cast.i64().unwrap().get(1), None);
    }

    #[test]
    fn bulk_failure_names_the_column() {
        let series = Series::new("age".into(), vec!["二十八"]);
        match cast_series(&series, Dtype::Integer).unwrap_err() {
            FlowError::ColumnCast { column, from, to } => {
                assert_eq!(column, "age");
                assert_eq!(from, "str");
                assert_eq!(to, "i64");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn per_value_failure_names_the_row() {
        let series = Series::new("age".into(), vec![Some("28"), None, Some("abc")]);
        match cast_series(&series, Dtype::Integer).unwrap_err() {
            FlowError::ValueCast {
                row_number, value, ..
            } => {
                assert_eq!(row_number, 3);
                assert_eq!(value, Value::from("abc"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn floats_truncate_to_integers() {
        let series = Series::new("n".into(), vec![2.9f64, -1.5]);
        let cast = cast_series(&series, Dtype::Integer).unwrap();
        assert_eq!(cast.i64().unwrap().get(0), Some(2));
        assert_eq!(cast.i64().unwrap().get(1), Some(-1));
    }

    #[test]
    fn nan_is_treated_as_missing() {
        let series = Series::new("n".into(), vec![1.0f64, f64::NAN]);
        assert!(has_missing(&series));
        let cast = cast_series(&series, Dtype::Integer).unwrap();
        assert_eq!(cast.i64().unwrap().get(1), None);
    }

    #[test]
    fn text_to_timestamp() {
        let series = Series::new("birthday".into(), vec!["1995-10-19", "1998-3-25"]);
        let cast = cast_series(&series, Dtype::Timestamp).unwrap();
        assert_eq!(
            cast.dtype(),
            &DataType::Datetime(TimeUnit::Nanoseconds, None)
        );
    }

    #[test]
    fn numbers_to_text_drop_trailing_zeros() {
        let series = Series::new("n".into(), vec![28.0f64, 1.5]);
        let cast = cast_series(&series, Dtype::Text).unwrap();
        assert_eq!(cast.str().unwrap().get(0), Some("28"));
        assert_eq!(cast.str().unwrap().get(1), Some("1.5"));
    }

    #[test]
    fn cast_column_replaces_in_place() {
        let mut df = DataFrame::new(vec![
            Series::new("a".into(), vec!["1", "2"]).into(),
            Series::new("b".into(), vec!["x", "y"]).into(),
        ])
        .unwrap();
        cast_column(&mut df, "a", Dtype::Float).unwrap();
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.get_column_names_str(), ["a", "b"]);
    }
}
