//! Frame shaping: renames, broadcasts, NaN cleanup and column order.

use polars::prelude::{DataFrame, DataType, NamedFrom, PlSmallStr, Series};
use prep_model::{CastFailure, Result, Value, series_from_values};

/// Renames `(source, target)` pairs in order.
///
/// A pair is skipped when the target already exists or the source is
/// absent. Returns the targets that were actually renamed.
pub fn rename_columns(df: &mut DataFrame, renames: &[(String, String)]) -> Result<Vec<String>> {
    let mut renamed = Vec::new();
    for (source, target) in renames {
        if source == target || df.column(target).is_ok() {
            continue;
        }
        if df.column(source).is_err() {
            tracing::warn!(source = %source, target = %target, "source column not found, rename skipped");
            continue;
        }
        df.rename(source, PlSmallStr::from(target.as_str()))?;
        renamed.push(target.clone());
    }
    Ok(renamed)
}

/// Stretches a hook result to the frame height.
///
/// A series of the right length is renamed; a single-element series is
/// repeated. Any other length is returned as the error.
pub fn fit_to_height(series: Series, name: &str, height: usize) -> std::result::Result<Series, usize> {
    match series.len() {
        len if len == height => Ok(series.with_name(PlSmallStr::from(name))),
        1 => Ok(series.new_from_index(0, height).with_name(PlSmallStr::from(name))),
        len => Err(len),
    }
}

/// A column holding `value` on every row.
pub fn broadcast_value(
    name: &str,
    value: &Value,
    height: usize,
) -> std::result::Result<Series, CastFailure> {
    series_from_values(name, &vec![value.clone(); height])
}

/// Replaces NaN with null in every float column.
pub fn normalize_missing(df: &mut DataFrame) -> Result<()> {
    let float_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::Float32 | DataType::Float64))
        .map(|c| c.name().to_string())
        .collect();

    for name in float_columns {
        let series = df.column(&name)?.as_materialized_series().clone();
        let cleaned = match series.dtype() {
            DataType::Float32 => {
                let values: Vec<Option<f32>> = series
                    .f32()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect();
                Series::new(series.name().clone(), values)
            }
            _ => {
                let values: Vec<Option<f64>> = series
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect();
                Series::new(series.name().clone(), values)
            }
        };
        df.with_column(cleaned)?;
    }
    Ok(())
}

/// Projects `df` onto exactly the `order` columns, in that order.
///
/// Columns not listed are dropped; a listed column that is absent is an error.
pub fn reorder_columns(df: &DataFrame, order: &[String]) -> Result<DataFrame> {
    let dropped = df.width().saturating_sub(order.len());
    if dropped > 0 {
        tracing::debug!(dropped, "dropping undeclared columns");
    }
    Ok(df.select(order.iter().map(String::as_str))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("名前".into(), vec!["a", "b"]).into(),
            Series::new("age".into(), vec![1i64, 2]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn rename_skips_absent_and_existing() {
        let mut df = frame();
        let renames = vec![
            ("名前".to_string(), "name".to_string()),
            ("性別".to_string(), "gender".to_string()),
            ("name".to_string(), "age".to_string()),
        ];
        let renamed = rename_columns(&mut df, &renames).unwrap();
        assert_eq!(renamed, ["name"]);
        assert_eq!(df.get_column_names_str(), ["name", "age"]);
    }

    #[test]
    fn fits_series_to_height() {
        let one = Series::new("x".into(), vec![7i64]);
        let fitted = fit_to_height(one, "score", 3).unwrap();
        assert_eq!(fitted.name().as_str(), "score");
        assert_eq!(fitted.len(), 3);
        assert_eq!(fitted.i64().unwrap().get(2), Some(7));

        let two = Series::new("x".into(), vec![1i64, 2]);
        assert_eq!(fit_to_height(two, "score", 3).unwrap_err(), 2);
    }

    #[test]
    fn broadcasts_scalars() {
        let series = broadcast_value("flag", &Value::Boolean(true), 2).unwrap();
        assert_eq!(series.dtype(), &DataType::Boolean);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn nan_becomes_null() {
        let mut df = DataFrame::new(vec![
            Series::new("x".into(), vec![1.0f64, f64::NAN]).into(),
        ])
        .unwrap();
        normalize_missing(&mut df).unwrap();
        assert_eq!(df.column("x").unwrap().null_count(), 1);
    }

    #[test]
    fn reorders_to_declared_set() {
        let df = DataFrame::new(vec![
            Series::new("c".into(), vec![1i64]).into(),
            Series::new("extra".into(), vec![1i64]).into(),
            Series::new("a".into(), vec![1i64]).into(),
        ])
        .unwrap();
        let ordered = reorder_columns(&df, &["a".to_string(), "c".to_string()]).unwrap();
        assert_eq!(ordered.get_column_names_str(), ["a", "c"]);
        assert!(reorder_columns(&df, &["missing".to_string()]).is_err());
    }
}
