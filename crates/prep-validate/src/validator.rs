use polars::prelude::DataFrame;
use prep_model::Result;

use crate::checks::{category, columns, dates, nullable, pattern};
use crate::{CategoryCondition, RegexCondition};

/// Runs the static checks against one frame.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    df: &'a DataFrame,
}

impl<'a> Validator<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn necessary_columns(&self, columns: &[String]) -> Result<()> {
        columns::check_necessary(self.df, columns)
    }

    pub fn unnecessary_columns(&self, columns: &[String]) -> Result<()> {
        columns::check_unnecessary(self.df, columns)
    }

    pub fn nullable(&self, conditions: &[(String, bool)]) -> Result<()> {
        nullable::check(self.df, conditions)
    }

    pub fn datetime(&self, conditions: &[(String, bool)]) -> Result<()> {
        dates::check(self.df, conditions)
    }

    pub fn regexp(&self, conditions: &[(String, RegexCondition)]) -> Result<()> {
        pattern::check(self.df, conditions)
    }

    pub fn category(&self, conditions: &[(String, CategoryCondition)]) -> Result<()> {
        category::check(self.df, conditions)
    }
}
