//! Missing-value check.

use polars::prelude::DataFrame;
use prep_model::{FlowError, Result};

use crate::cell;

/// Fails on the first missing value in a column declared non-nullable.
pub fn check(df: &DataFrame, conditions: &[(String, bool)]) -> Result<()> {
    for (name, nullable) in conditions {
        if *nullable {
            continue;
        }
        let column = df.column(name)?;
        for idx in 0..df.height() {
            let value = cell(column, idx);
            if value.is_missing() {
                return Err(FlowError::NullValueFound {
                    column: name.clone(),
                    row_number: idx + 1,
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    #[test]
    fn nan_counts_as_missing() {
        let df = DataFrame::new(vec![
            Series::new("score".into(), vec![Some(1.0), Some(f64::NAN), None]).into(),
        ])
        .unwrap();
        let err = check(&df, &[("score".to_string(), false)]).unwrap_err();
        assert_eq!(err.row_number(), Some(2));
        assert!(check(&df, &[("score".to_string(), true)]).is_ok());
    }
}
