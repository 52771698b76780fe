//! Schemas declared from command-line flags.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use prep_core::{Column, Dtype, Schema};

/// `NAME[:TYPE]`; a column without a type is kept as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: Option<Dtype>,
}

impl FromStr for ColumnSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, dtype) = match s.split_once(':') {
            Some((name, ty)) => {
                let dtype = ty.parse::<Dtype>().map_err(|e| e.to_string())?;
                (name.trim(), Some(dtype))
            }
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(format!("missing column name in '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            dtype,
        })
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dtype {
            Some(dtype) => write!(f, "{}:{}", self.name, dtype.name()),
            None => f.write_str(&self.name),
        }
    }
}

/// Parses `KEY=VALUE`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Everything needed to build a one-off schema.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub not_null: Vec<String>,
    /// `(column, pattern)`
    pub regex: Vec<(String, String)>,
    /// `(column, comma separated values)`
    pub category: Vec<(String, String)>,
    /// `(source header, column)`
    pub rename: Vec<(String, String)>,
    pub sheet: Option<String>,
}

impl Declaration {
    fn declares(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    fn require_declared<'a>(&self, flag: &str, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.declares(name) {
                bail!("--{flag} refers to undeclared column '{name}'");
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Schema> {
        if self.columns.is_empty() {
            bail!("declare at least one column with --column NAME:TYPE");
        }
        self.require_declared("not-null", self.not_null.iter().map(String::as_str))?;
        self.require_declared("regex", self.regex.iter().map(|(c, _)| c.as_str()))?;
        self.require_declared("category", self.category.iter().map(|(c, _)| c.as_str()))?;
        self.require_declared("rename", self.rename.iter().map(|(_, c)| c.as_str()))?;

        let mut builder = Schema::builder(self.name.clone());
        for spec in &self.columns {
            let mut column = spec.dtype.map_or_else(Column::untyped, Column::new);
            if self.not_null.contains(&spec.name) {
                column = column.nullable(false);
            }
            if let Some((_, pattern)) = self.regex.iter().find(|(c, _)| *c == spec.name) {
                column = column.regexp(pattern.clone());
            }
            if let Some((_, values)) = self.category.iter().find(|(c, _)| *c == spec.name) {
                column = column.category(values.split(',').map(str::trim));
            }
            if let Some((source, _)) = self.rename.iter().find(|(_, c)| *c == spec.name) {
                column = column.source_name(source.clone());
            }
            builder = builder.column(spec.name.clone(), column);
        }
        if let Some(sheet) = &self.sheet {
            builder = builder.sheet_name(sheet.clone());
        }
        Ok(builder.build()?)
    }
}
