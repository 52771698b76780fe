//! Regular-expression check.
//!
//! Patterns match at the start of the value's text form only, so `[0-9]+`
//! accepts `"12ab"`. Add `$` to require a full match.

use polars::prelude::DataFrame;
use prep_model::{FlowError, Result};
use regex::Regex;

use crate::cell;

/// A compiled pattern plus whether missing values are exempt.
#[derive(Debug, Clone)]
pub struct RegexCondition {
    pub pattern: String,
    pub regex: Regex,
    pub nullable: bool,
}

impl RegexCondition {
    /// Compiles `pattern` anchored at the start.
    pub fn new(pattern: impl Into<String>, nullable: bool) -> std::result::Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self {
            pattern,
            regex,
            nullable,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Fails on the first value whose text form does not match its pattern.
pub fn check(df: &DataFrame, conditions: &[(String, RegexCondition)]) -> Result<()> {
    for (name, condition) in conditions {
        let column = df.column(name)?;
        for idx in 0..df.height() {
            let value = cell(column, idx);
            if value.is_missing() && condition.nullable {
                continue;
            }
            if !condition.is_match(&value.to_text()) {
                return Err(FlowError::InvalidRegexpFound {
                    column: name.clone(),
                    row_number: idx + 1,
                    value,
                    regexp: condition.pattern.clone(),
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
    fn anchored_at_start_only() {
        let condition = RegexCondition::new("[0-9]+", false).unwrap();
        assert!(condition.is_match("12ab"));
        assert!(!condition.is_match("ab12"));
        let alternation = RegexCondition::new("a|b", false).unwrap();
        assert!(!alternation.is_match("cb"));
    }

    #[test]
    fn reports_first_mismatch() {
        let df = DataFrame::new(vec![
            Series::new("prefecture".into(), vec!["tokyo", "OSAKA"]).into(),
        ])
        .unwrap();
        let condition = RegexCondition::new("^[A-Z]+$", true).unwrap();
        let err = check(&df, &[("prefecture".to_string(), condition)]).unwrap_err();
        match err {
            FlowError::InvalidRegexpFound {
                row_number,
                regexp,
                ..
            } => {
                assert_eq!(row_number, 1);
                assert_eq!(regexp, "^[A-Z]+$");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_exempt_only_when_nullable() {
        let df = DataFrame::new(vec![Series::new("code".into(), vec![None::<&str>]).into()]).unwrap();
        let lenient = RegexCondition::new("[A-Z]", true).unwrap();
        check(&df, &[("code".to_string(), lenient)]).unwrap();
        let strict = RegexCondition::new("[A-Z]", false).unwrap();
        assert!(check(&df, &[("code".to_string(), strict)]).is_err());
    }
}
