//! Hook registrations.
//!
//! A hook is a named closure attached to a schema and tagged with its kind,
//! an optional target column and a phase. Creators and modifiers produce a
//! column (or a scalar broadcast to every row); filters produce a new table.

use std::fmt;
use std::sync::Arc;

use polars::prelude::{Column, DataFrame, PolarsResult, Series};
use prep_model::Value;

/// What a hook does with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Writes a new column (or overwrites one) under its target name.
    Creator,
    /// Replaces an existing column's values.
    Modifier,
    /// Replaces the working table.
    Filter,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Creator => "creator",
            HookKind::Modifier => "modifier",
            HookKind::Filter => "filter",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a hook body returns.
#[derive(Debug, Clone)]
pub enum HookOutput {
    Series(Series),
    Frame(DataFrame),
    Scalar(Value),
}

impl HookOutput {
    pub fn shape_name(&self) -> &'static str {
        match self {
            HookOutput::Series(_) => "a column",
            HookOutput::Frame(_) => "a table",
            HookOutput::Scalar(_) => "a scalar",
        }
    }
}

impl From<Series> for HookOutput {
    fn from(series: Series) -> Self {
        HookOutput::Series(series)
    }
}

impl From<Column> for HookOutput {
    fn from(column: Column) -> Self {
        HookOutput::Series(column.take_materialized_series())
    }
}

impl From<DataFrame> for HookOutput {
    fn from(frame: DataFrame) -> Self {
        HookOutput::Frame(frame)
    }
}

impl From<Value> for HookOutput {
    fn from(value: Value) -> Self {
        HookOutput::Scalar(value)
    }
}

type NullaryFn = dyn Fn() -> PolarsResult<HookOutput> + Send + Sync;
type UnaryFn = dyn Fn(&DataFrame) -> PolarsResult<HookOutput> + Send + Sync;

/// A hook's callable. Unary bodies receive the current working table.
#[derive(Clone)]
pub enum HookBody {
    Nullary(Arc<NullaryFn>),
    Unary(Arc<UnaryFn>),
}

impl fmt::Debug for HookBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookBody::Nullary(_) => f.write_str("Nullary(..)"),
            HookBody::Unary(_) => f.write_str("Unary(..)"),
        }
    }
}

/// A registered hook.
///
/// ```
/// use polars::prelude::*;
/// use prep_core::{Hook, HookKind};
///
/// let adults = Hook::filter("adults", |df: &DataFrame| {
///     let mask = df.column("age")?.as_materialized_series().gt_eq(20)?;
///     df.filter(&mask)
/// })
/// .order(1);
/// assert_eq!(adults.kind, HookKind::Filter);
/// assert_eq!(adults.order, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Hook {
    pub name: String,
    pub kind: HookKind,
    pub target: Option<String>,
    pub order: i64,
    /// Run after this phase's reference merges and reference modifiers.
    /// Only creators and filters honour it.
    pub after_merge: bool,
    pub body: HookBody,
}

impl Hook {
    fn unary<F, O>(name: impl Into<String>, kind: HookKind, target: Option<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self {
            name: name.into(),
            kind,
            target,
            order: 0,
            after_merge: false,
            body: HookBody::Unary(Arc::new(move |df| f(df).map(Into::into))),
        }
    }

    fn nullary<F, O>(name: impl Into<String>, kind: HookKind, target: Option<String>, f: F) -> Self
    where
        F: Fn() -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self {
            name: name.into(),
            kind,
            target,
            order: 0,
            after_merge: false,
            body: HookBody::Nullary(Arc::new(move || f().map(Into::into))),
        }
    }

    /// A creator that derives its column from the working table.
    pub fn creator<F, O>(name: impl Into<String>, target: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self::unary(name, HookKind::Creator, Some(target.into()), f)
    }

    /// A creator that takes no arguments.
    pub fn creator_nullary<F, O>(name: impl Into<String>, target: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self::nullary(name, HookKind::Creator, Some(target.into()), f)
    }

    pub fn modifier<F, O>(name: impl Into<String>, target: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self::unary(name, HookKind::Modifier, Some(target.into()), f)
    }

    pub fn modifier_nullary<F, O>(name: impl Into<String>, target: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self::nullary(name, HookKind::Modifier, Some(target.into()), f)
    }

    /// A filter; its body must return a table.
    pub fn filter<F, O>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> PolarsResult<O> + Send + Sync + 'static,
        O: Into<HookOutput>,
    {
        Self::unary(name, HookKind::Filter, None, f)
    }

    #[must_use]
    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn after_merge(mut self) -> Self {
        self.after_merge = true;
        self
    }

    /// Invokes the body; nullary bodies ignore the table.
    pub fn call(&self, df: &DataFrame) -> PolarsResult<HookOutput> {
        tracing::trace!(hook = %self.name, kind = %self.kind, "invoking hook");
        match &self.body {
            HookBody::Nullary(f) => f(),
            HookBody::Unary(f) => f(df),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::NamedFrom;

    #[test]
    fn nullary_ignores_table() {
        let hook = Hook::creator_nullary("flag", "flag", || Ok(Value::Boolean(true)));
        let out = hook.call(&DataFrame::empty()).unwrap();
        assert!(matches!(out, HookOutput::Scalar(Value::Boolean(true))));
    }

    #[test]
    fn unary_sees_table() {
        let df = DataFrame::new(vec![Series::new("n".into(), vec![1i64, 2]).into()]).unwrap();
        let hook = Hook::creator("count", "count", |df: &DataFrame| {
            Ok(Value::Integer(df.height() as i64))
        });
        match hook.call(&df).unwrap() {
            HookOutput::Scalar(value) => assert_eq!(value, Value::Integer(2)),
            other => panic!("unexpected {}", other.shape_name()),
        }
    }

    #[test]
    fn builders_set_tags() {
        let hook = Hook::filter("keep", |df: &DataFrame| Ok(df.clone()))
            .order(2)
            .after_merge();
        assert_eq!(hook.kind, HookKind::Filter);
        assert!(hook.target.is_none());
        assert_eq!(hook.order, 2);
        assert!(hook.after_merge);
    }
}
