//! Error taxonomy.
//!
//! [`FlowError`] covers everything that can go wrong while a dataset is
//! constructed or re-validated. Every variant carries the context needed to
//! locate the problem: the column, the 1-based row number, and the
//! offending value.
//!
//! [`SchemaError`] covers mistakes in a schema declaration itself. These
//! are reported when the schema is built, before any data is touched.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::dtype::Dtype;
use crate::value::Value;

/// Result alias for dataset construction and validation.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised while building or validating a dataset.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The workbook has no sheet with the configured name.
    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    /// Declared base columns absent from the input.
    #[error("necessary columns not found: {}", .columns.join(", "))]
    NecessaryColumnsNotFound { columns: Vec<String> },

    /// Input columns that are not declared base columns.
    #[error("unnecessary columns exist: {}", .columns.join(", "))]
    UnnecessaryColumnsExists { columns: Vec<String> },

    /// No reference dataset was supplied for the named schema.
    #[error("reference data '{name}' not found")]
    ReferenceDataNotFound { name: String },

    /// A reference points at a schema that has never constructed a dataset.
    #[error("reference data for '{name}' has not been initialized")]
    ReferenceDataNotInitialization { name: String },

    #[error("null value found in column '{column}' at row {row_number}")]
    NullValueFound {
        column: String,
        row_number: usize,
        value: Value,
    },

    /// A date-like value naming a day that does not exist.
    #[error("invalid date {value} in column '{column}' at row {row_number}")]
    InvalidDateFound {
        column: String,
        row_number: usize,
        value: Value,
    },

    /// A value that cannot be read as a date at all.
    #[error("invalid date literal {value} in column '{column}' at row {row_number}")]
    InvalidDateLiteralFound {
        column: String,
        row_number: usize,
        value: Value,
    },

    #[error(
        "value {value} in column '{column}' at row {row_number} does not match pattern '{regexp}'"
    )]
    InvalidRegexpFound {
        column: String,
        row_number: usize,
        value: Value,
        regexp: String,
    },

    #[error(
        "value {value} in column '{column}' at row {row_number} is not one of [{}]",
        format_category(.category)
    )]
    InvalidCategoryFound {
        column: String,
        row_number: usize,
        value: Value,
        category: Vec<Value>,
    },

    /// The whole-column cast failed.
    #[error("cannot cast column '{column}' from {from} to {to}")]
    ColumnCast {
        column: String,
        from: String,
        to: String,
    },

    /// A single value failed the per-value cast.
    #[error("cannot cast {value} in column '{column}' at row {row_number} from {from} to {to}")]
    ValueCast {
        column: String,
        row_number: usize,
        value: Value,
        from: String,
        to: String,
    },

    /// A modifier or creator was aimed at a column it cannot act on.
    #[error("decorator error on '{column}': {detail}")]
    Decorator { column: String, detail: String },

    /// A hook returned a shape its kind does not accept.
    #[error("hook '{hook}' returned an unsupported value: {detail}")]
    DecoratorReturnType { hook: String, detail: String },

    /// A hook body or column modifier failed.
    #[error("hook '{hook}' failed")]
    Hook {
        hook: String,
        #[source]
        source: PolarsError,
    },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

fn format_category(category: &[Value]) -> String {
    category
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl FlowError {
    /// Stable name of the error kind, for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SheetNotFound { .. } => "SheetNotFoundError",
            Self::NecessaryColumnsNotFound { .. } => "NecessaryColumnsNotFoundError",
            Self::UnnecessaryColumnsExists { .. } => "UnnecessaryColumnsExistsError",
            Self::ReferenceDataNotFound { .. } => "ReferenceDataNotFoundError",
            Self::ReferenceDataNotInitialization { .. } => "ReferenceDataNotInitializationError",
            Self::NullValueFound { .. } => "NullValueFoundError",
            Self::InvalidDateFound { .. } => "InvalidDateFoundError",
            Self::InvalidDateLiteralFound { .. } => "InvalidDateLiteralFoundError",
            Self::InvalidRegexpFound { .. } => "InvalidRegexpFoundError",
            Self::InvalidCategoryFound { .. } => "InvalidCategoryFoundError",
            Self::ColumnCast { .. } => "ColumnCastError",
            Self::ValueCast { .. } => "ValueCastError",
            Self::Decorator { .. } => "DecoratorError",
            Self::DecoratorReturnType { .. } => "DecoratorReturnTypeError",
            Self::Hook { .. } => "HookError",
            Self::Frame(_) => "FrameError",
        }
    }

    /// The column the error refers to, when there is exactly one.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::NullValueFound { column, .. }
            | Self::InvalidDateFound { column, .. }
            | Self::InvalidDateLiteralFound { column, .. }
            | Self::InvalidRegexpFound { column, .. }
            | Self::InvalidCategoryFound { column, .. }
            | Self::ColumnCast { column, .. }
            | Self::ValueCast { column, .. }
            | Self::Decorator { column, .. } => Some(column),
            _ => None,
        }
    }

    /// The 1-based data row the error refers to, if any.
    pub fn row_number(&self) -> Option<usize> {
        match self {
            Self::NullValueFound { row_number, .. }
            | Self::InvalidDateFound { row_number, .. }
            | Self::InvalidDateLiteralFound { row_number, .. }
            | Self::InvalidRegexpFound { row_number, .. }
            | Self::InvalidCategoryFound { row_number, .. }
            | Self::ValueCast { row_number, .. } => Some(*row_number),
            _ => None,
        }
    }

    /// The offending value, if the error is about one cell.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::NullValueFound { value, .. }
            | Self::InvalidDateFound { value, .. }
            | Self::InvalidDateLiteralFound { value, .. }
            | Self::InvalidRegexpFound { value, .. }
            | Self::InvalidCategoryFound { value, .. }
            | Self::ValueCast { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Builds a [`FlowError::ColumnCast`] from a polars type name and a target type.
    pub fn column_cast(column: &str, from: &str, to: Dtype) -> Self {
        Self::ColumnCast {
            column: column.to_string(),
            from: from.to_string(),
            to: to.name().to_string(),
        }
    }
}

/// Mistakes in a schema declaration.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("attribute '{name}' is declared more than once")]
    DuplicateAttribute { name: String },

    #[error("invalid pattern for '{column}': {pattern}")]
    InvalidPattern {
        column: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown join kind '{value}', expected one of: full, left, inner")]
    InvalidJoinKind { value: String },

    #[error("schema '{schema}' declares no column '{column}'")]
    UnknownColumn { schema: String, column: String },

    #[error("reference '{name}' has no join keys")]
    MissingJoinKey { name: String },

    #[error("{kind} hook '{hook}' needs a target column")]
    MissingHookTarget { kind: String, hook: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = FlowError::InvalidCategoryFound {
            column: "prefecture".into(),
            row_number: 3,
            value: Value::from("nagoya"),
            category: vec![Value::from("tokyo"), Value::from("osaka")],
        };
        assert_eq!(
            err.to_string(),
            "value \"nagoya\" in column 'prefecture' at row 3 is not one of [\"tokyo\", \"osaka\"]"
        );
        assert_eq!(err.kind(), "InvalidCategoryFoundError");
        assert_eq!(err.row_number(), Some(3));
        assert_eq!(err.column(), Some("prefecture"));
    }

    #[test]
    fn column_list_errors_join_names() {
        let err = FlowError::NecessaryColumnsNotFound {
            columns: vec!["age".into(), "name".into()],
        };
        assert_eq!(err.to_string(), "necessary columns not found: age, name");
        assert_eq!(err.row_number(), None);
    }

    #[test]
    fn column_cast_uses_type_names() {
        let err = FlowError::column_cast("age", "str", Dtype::Integer);
        match err {
            FlowError::ColumnCast { from, to, .. } => {
                assert_eq!(from, "str");
                assert_eq!(to, "i64");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
