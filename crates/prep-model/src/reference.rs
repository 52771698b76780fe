//! Cross-dataset references.
//!
//! A [`Reference`] pulls one column of another schema's dataset into this
//! one through a join. The foreign schema is identified by a
//! [`SchemaHandle`], which also records whether that schema has produced a
//! dataset yet.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::column::Modifier;
use crate::dtype::Dtype;
use crate::error::SchemaError;
use crate::value::Value;

/// Join semantics for a reference merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    /// Keep every row of both sides.
    Full,
    /// Keep every local row.
    Left,
    /// Keep only rows with a match on both sides.
    Inner,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Full => "full",
            JoinKind::Left => "left",
            JoinKind::Inner => "inner",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "outer" => Ok(JoinKind::Full),
            "left" => Ok(JoinKind::Left),
            "inner" => Ok(JoinKind::Inner),
            _ => Err(SchemaError::InvalidJoinKind {
                value: s.to_string(),
            }),
        }
    }
}

/// Identity of a schema plus its activation flag.
///
/// Clones share the flag, so a reference held by another schema sees the
/// activation as soon as the owning schema constructs its first dataset.
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    name: Arc<str>,
    activated: Arc<AtomicBool>,
}

impl SchemaHandle {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            activated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Marks the schema as having constructed at least one dataset.
    pub fn activate(&self) {
        self.activated.store(true, Ordering::Release);
    }

    /// Whether both handles belong to the same schema instance.
    pub fn same_schema(&self, other: &SchemaHandle) -> bool {
        Arc::ptr_eq(&self.activated, &other.activated)
    }
}

/// A column of a specific schema, used as a reference target.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    pub owner: SchemaHandle,
    pub column: String,
}

impl ColumnRef {
    pub fn new(owner: SchemaHandle, column: impl Into<String>) -> Self {
        Self {
            owner,
            column: column.into(),
        }
    }
}

/// A column populated by joining another schema's dataset.
#[derive(Debug, Clone)]
pub struct Reference {
    pub column: ColumnRef,
    /// Join keys, present under the same names on both sides.
    pub on: Vec<String>,
    pub how: JoinKind,
    pub order: i64,
    pub dtype: Option<Dtype>,
    pub nullable: bool,
    pub regexp: Option<String>,
    pub category: Option<Vec<Value>>,
    /// Applied to the merged column right after its merge phase.
    pub modifier: Option<Modifier>,
    pub description: Option<String>,
}

impl Reference {
    pub fn new<I, S>(column: ColumnRef, on: I, how: JoinKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column,
            on: on.into_iter().map(Into::into).collect(),
            how,
            order: 0,
            dtype: None,
            nullable: true,
            regexp: None,
            category: None,
            modifier: None,
            description: None,
        }
    }

    #[must_use]
    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn dtype(mut self, dtype: Dtype) -> Self {
        self.dtype = Some(dtype);
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
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
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

    #[test]
    fn join_kind_parses_case_insensitively() {
        assert_eq!("LEFT".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("outer".parse::<JoinKind>().unwrap(), JoinKind::Full);
        assert!(matches!(
            "cross".parse::<JoinKind>(),
            Err(SchemaError::InvalidJoinKind { .. })
        ));
    }

    #[test]
    fn handles_share_activation() {
        let handle = SchemaHandle::new("PrefectureFlow");
        let clone = handle.clone();
        assert!(!clone.is_activated());
        handle.activate();
        assert!(clone.is_activated());
        assert!(handle.same_schema(&clone));
        assert!(!handle.same_schema(&SchemaHandle::new("PrefectureFlow")));
    }
}
