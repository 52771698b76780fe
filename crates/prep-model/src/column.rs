//! Column descriptors.

use std::fmt;
use std::sync::Arc;

use polars::prelude::{PolarsError, PolarsResult, Series};

use crate::dtype::{CastFailure, Dtype};
use crate::value::{Value, series_from_values, series_values, values_to_series};

type ModifierFn = dyn Fn(&Series) -> PolarsResult<Series> + Send + Sync;

/// A column-level transformation applied during its phase.
///
/// The function receives the whole column and returns its replacement,
/// which must have the same length.
#[derive(Clone)]
pub struct Modifier(Arc<ModifierFn>);

impl Modifier {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Series) -> PolarsResult<Series> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Maps every non-missing value through `f` on its text form.
    ///
    /// Missing values stay missing and the result is a text column.
    pub fn map_text<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::new(move |series| {
            let mapped: Vec<Value> = series_values(series)?
                .into_iter()
                .map(|value| {
                    if value.is_missing() {
                        Value::Null
                    } else {
                        Value::Text(f(&value.to_text()))
                    }
                })
                .collect();
            values_to_series(series.name(), Dtype::Text, &mapped).map_err(into_polars)
        })
    }

    /// Maps every non-missing value through `f`.
    ///
    /// The result type is inferred from the returned values.
    pub fn map_values<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |series| {
            let mapped: Vec<Value> = series_values(series)?
                .into_iter()
                .map(|value| if value.is_missing() { Value::Null } else { f(value) })
                .collect();
            series_from_values(series.name(), &mapped).map_err(into_polars)
        })
    }

    pub fn apply(&self, series: &Series) -> PolarsResult<Series> {
        (self.0)(series)
    }
}

fn into_polars(failure: CastFailure) -> PolarsError {
    PolarsError::ComputeError(failure.to_string().into())
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modifier(..)")
    }
}

/// A declared column: its target type, constraints and optional
/// pre-cast (`original_*`) constraints.
///
/// Built with chained setters:
///
/// ```
/// use prep_model::{Column, Dtype};
///
/// let gender = Column::new(Dtype::Text)
///     .source_name("性別")
///     .nullable(false)
///     .category(["man", "woman"]);
/// assert_eq!(gender.source_name.as_deref(), Some("性別"));
/// ```
#[derive(Debug, Clone)]
pub struct Column {
    pub dtype: Option<Dtype>,
    /// Header in the input that is renamed to this attribute.
    pub source_name: Option<String>,
    pub nullable: bool,
    pub regexp: Option<String>,
    pub category: Option<Vec<Value>>,
    /// Type the raw input is cast to before any transformation.
    pub original_dtype: Option<Dtype>,
    pub original_nullable: bool,
    pub original_regexp: Option<String>,
    pub original_category: Option<Vec<Value>>,
    pub modifier: Option<Modifier>,
    pub order: i64,
    pub description: Option<String>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            dtype: None,
            source_name: None,
            nullable: true,
            regexp: None,
            category: None,
            original_dtype: None,
            original_nullable: true,
            original_regexp: None,
            original_category: None,
            modifier: None,
            order: 0,
            description: None,
        }
    }
}

impl Column {
    pub fn new(dtype: Dtype) -> Self {
        Self {
            dtype: Some(dtype),
            ..Self::default()
        }
    }

    /// A column with no declared type; it is never cast.
    pub fn untyped() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn regexp(mut self, pattern: impl Into<String>) -> Self {
        self.regexp = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn category<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.category = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn original_dtype(mut self, dtype: Dtype) -> Self {
        self.original_dtype = Some(dtype);
        self
    }

    #[must_use]
    pub fn original_nullable(mut self, nullable: bool) -> Self {
        self.original_nullable = nullable;
        self
    }

    #[must_use]
    pub fn original_regexp(mut self, pattern: impl Into<String>) -> Self {
        self.original_regexp = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn original_category<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.original_category = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    #[must_use]
    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{DataType, NamedFrom};

    #[test]
    fn defaults_are_permissive() {
        let column = Column::new(Dtype::Integer);
        assert!(column.nullable);
        assert!(column.original_nullable);
        assert_eq!(column.order, 0);
        assert!(column.regexp.is_none());
    }

    #[test]
    fn map_text_skips_missing() {
        let series = Series::new("name".into(), vec![Some("Tokyo"), None]);
        let lower = Modifier::map_text(|s| s.to_lowercase());
        let out = lower.apply(&series).unwrap();
        assert_eq!(out.name().as_str(), "name");
        assert_eq!(out.str().unwrap().get(0), Some("tokyo"));
        assert_eq!(out.str().unwrap().get(1), None);
    }

    #[test]
    fn map_values_infers_type() {
        let series = Series::new("age".into(), vec![Some(20i64), None, Some(40)]);
        let halve = Modifier::map_values(|v| Value::Float(v.as_f64().unwrap_or(0.0) / 2.0));
        let out = halve.apply(&series).unwrap();
        assert_eq!(out.dtype(), &DataType::Float64);
        assert_eq!(out.f64().unwrap().get(0), Some(10.0));
        assert_eq!(out.null_count(), 1);
    }
}
