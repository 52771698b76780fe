//! Category membership check.

use polars::prelude::DataFrame;
use prep_model::{FlowError, Result, Value};

use crate::cell;

/// Allowed values plus whether missing values are exempt.
#[derive(Debug, Clone)]
pub struct CategoryCondition {
    pub category: Vec<Value>,
    pub nullable: bool,
}

impl CategoryCondition {
    pub fn new(category: Vec<Value>, nullable: bool) -> Self {
        Self { category, nullable }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.category.iter().any(|allowed| allowed.loosely_eq(value))
    }
}

/// Fails on the first value outside its column's category.
pub fn check(df: &DataFrame, conditions: &[(String, CategoryCondition)]) -> Result<()> {
    for (name, condition) in conditions {
        let column = df.column(name)?;
        for idx in 0..df.height() {
            let value = cell(column, idx);
            if value.is_missing() && condition.nullable {
                continue;
            }
            if !condition.contains(&value) {
                return Err(FlowError::InvalidCategoryFound {
                    column: name.clone(),
                    row_number: idx + 1,
                    value,
                    category: condition.category.clone(),
                });
            }
        }
    }
    Ok(())
}
