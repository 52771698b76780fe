//! Column-set checks.
//!
//! Both checks compare the frame's header against a declared set and
//! report every offending name at once, in declaration (or frame) order.

use polars::prelude::DataFrame;
use prep_model::{FlowError, Result};

/// Fails when any of `columns` is absent from `df`.
pub fn check_necessary(df: &DataFrame, columns: &[String]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| !present.iter().any(|p| p.as_str() == name.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlowError::NecessaryColumnsNotFound { columns: missing })
    }
}

/// Fails when `df` has a column that is not in `columns`.
pub fn check_unnecessary(df: &DataFrame, columns: &[String]) -> Result<()> {
    let extra: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !columns.iter().any(|c| c.as_str() == name.as_str()))
        .map(|name| name.to_string())
        .collect();
    if extra.is_empty() {
        Ok(())
    } else {
        Err(FlowError::UnnecessaryColumnsExists { columns: extra })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("name".into(), vec!["a"]).into(),
            Series::new("age".into(), vec!["1"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn reports_all_missing_columns() {
        let declared = vec!["name".to_string(), "gender".to_string(), "birthday".to_string()];
        let err = check_necessary(&frame(), &declared).unwrap_err();
        match err {
            FlowError::NecessaryColumnsNotFound { columns } => {
                assert_eq!(columns, ["gender", "birthday"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reports_all_extra_columns() {
        let declared = vec!["name".to_string()];
        let err = check_unnecessary(&frame(), &declared).unwrap_err();
        match err {
            FlowError::UnnecessaryColumnsExists { columns } => assert_eq!(columns, ["age"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exact_header_passes_both() {
        let declared = vec!["age".to_string(), "name".to_string()];
        check_necessary(&frame(), &declared).unwrap();
        check_unnecessary(&frame(), &declared).unwrap();
    }
}
