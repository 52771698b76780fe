//! Schema declarations.
//!
//! A [`Schema`] is an immutable, cheaply clonable registry of named column
//! and reference definitions plus hooks. Definitions are kept in
//! declaration order with a name-to-index map alongside, so lookups never
//! scan by value.
//!
//! ```
//! use prep_core::{Column, Dtype, Schema};
//!
//! let users = Schema::builder("UserFlow")
//!     .column("name", Column::new(Dtype::Text).source_name("名前"))
//!     .column("age", Column::new(Dtype::Integer).nullable(false))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(users.rename_map(), [("名前".to_string(), "name".to_string())]);
//! assert!(!users.is_activated());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use prep_model::{
    Column, ColumnRef, Dtype, Modifier, Reference, SchemaError, SchemaHandle, Value,
};
use prep_validate::{CategoryCondition, RegexCondition};

use crate::hooks::{Hook, HookKind};

/// Per-schema settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Sheet read when the source is a workbook.
    pub sheet_name: String,
    /// Convert NaN to null in the final table.
    pub normalize_missing: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            normalize_missing: true,
        }
    }
}

/// Which columns a query or validation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationScope {
    /// Every declared column.
    #[default]
    All,
    /// Declared columns that are neither reference attributes nor creator
    /// targets.
    BaseOnly,
}

/// One declared attribute.
#[derive(Debug, Clone)]
pub enum Definition {
    Column(Column),
    Reference(Reference),
}

impl Definition {
    pub fn order(&self) -> i64 {
        match self {
            Definition::Column(c) => c.order,
            Definition::Reference(r) => r.order,
        }
    }

    pub fn dtype(&self) -> Option<Dtype> {
        match self {
            Definition::Column(c) => c.dtype,
            Definition::Reference(r) => r.dtype,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Definition::Column(c) => c.nullable,
            Definition::Reference(r) => r.nullable,
        }
    }

    pub fn regexp(&self) -> Option<&str> {
        match self {
            Definition::Column(c) => c.regexp.as_deref(),
            Definition::Reference(r) => r.regexp.as_deref(),
        }
    }

    pub fn category(&self) -> Option<&[Value]> {
        match self {
            Definition::Column(c) => c.category.as_deref(),
            Definition::Reference(r) => r.category.as_deref(),
        }
    }

    pub fn modifier(&self) -> Option<&Modifier> {
        match self {
            Definition::Column(c) => c.modifier.as_ref(),
            Definition::Reference(r) => r.modifier.as_ref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Definition::Column(c) => c.description.as_deref(),
            Definition::Reference(r) => r.description.as_deref(),
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Definition::Reference(r) => Some(r),
            Definition::Column(_) => None,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Definition::Column(c) => Some(c),
            Definition::Reference(_) => None,
        }
    }
}

struct SchemaInner {
    handle: SchemaHandle,
    options: SchemaOptions,
    definitions: Vec<(String, Definition)>,
    index: BTreeMap<String, usize>,
    hooks: Vec<Hook>,
    /// Compiled `regexp` patterns, keyed by attribute.
    patterns: BTreeMap<String, RegexCondition>,
    /// Compiled `original_regexp` patterns, keyed by attribute.
    original_patterns: BTreeMap<String, RegexCondition>,
}

/// A built schema. Clones share the same declarations and activation state.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name())
            .field("columns", &self.columns(ValidationScope::All))
            .field("hooks", &self.inner.hooks.len())
            .finish()
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        self.inner.handle.name()
    }

    pub fn handle(&self) -> &SchemaHandle {
        &self.inner.handle
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.inner.options
    }

    /// Whether this schema has constructed at least one dataset.
    pub fn is_activated(&self) -> bool {
        self.inner.handle.is_activated()
    }

    /// A handle on one of this schema's attributes, for use in a [`Reference`].
    pub fn column_ref(&self, name: &str) -> Result<ColumnRef, SchemaError> {
        if self.inner.index.contains_key(name) {
            Ok(ColumnRef::new(self.inner.handle.clone(), name))
        } else {
            Err(SchemaError::UnknownColumn {
                schema: self.name().to_string(),
                column: name.to_string(),
            })
        }
    }

    /// All definitions in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.inner
            .definitions
            .iter()
            .map(|(name, def)| (name.as_str(), def))
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        let idx = *self.inner.index.get(name)?;
        self.inner.definitions.get(idx).map(|(_, def)| def)
    }

    /// Hooks of one kind, in registration order.
    pub fn hooks(&self, kind: HookKind) -> impl Iterator<Item = &Hook> {
        self.inner.hooks.iter().filter(move |h| h.kind == kind)
    }

    /// Hooks of one kind for one phase, in registration order.
    pub fn hooks_for(&self, kind: HookKind, phase: i64) -> impl Iterator<Item = &Hook> {
        self.hooks(kind).filter(move |h| h.order == phase)
    }

    pub fn is_reference(&self, name: &str) -> bool {
        self.definition(name)
            .is_some_and(|def| def.as_reference().is_some())
    }

    /// Attributes declared as references.
    pub fn reference_columns(&self) -> Vec<&str> {
        self.definitions()
            .filter(|(_, def)| def.as_reference().is_some())
            .map(|(name, _)| name)
            .collect()
    }

    /// Declared attributes targeted by at least one creator hook.
    pub fn creator_columns(&self) -> Vec<&str> {
        let targets: BTreeSet<&str> = self
            .hooks(HookKind::Creator)
            .filter_map(|h| h.target.as_deref())
            .collect();
        self.definitions()
            .map(|(name, _)| name)
            .filter(|name| targets.contains(name))
            .collect()
    }

    /// Columns produced by the pipeline rather than read from input.
    pub fn additional_columns(&self) -> Vec<&str> {
        let creators = self.creator_columns();
        self.definitions()
            .filter(|(name, def)| def.as_reference().is_some() || creators.contains(name))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_additional(&self, name: &str) -> bool {
        self.is_reference(name)
            || self
                .hooks(HookKind::Creator)
                .any(|h| h.target.as_deref() == Some(name))
    }

    /// Declared attribute names for the scope, in declaration order.
    pub fn columns(&self, scope: ValidationScope) -> Vec<String> {
        self.scoped(scope).map(|(name, _)| name.to_string()).collect()
    }

    fn scoped(&self, scope: ValidationScope) -> impl Iterator<Item = (&str, &Definition)> {
        self.definitions().filter(move |(name, _)| match scope {
            ValidationScope::All => true,
            ValidationScope::BaseOnly => !self.is_additional(name),
        })
    }

    /// Plain columns that are read from input, with their descriptors.
    fn base_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.scoped(ValidationScope::BaseOnly)
            .filter_map(|(name, def)| def.as_column().map(|c| (name, c)))
    }

    /// `(source name, attribute)` pairs for columns declaring a source name.
    pub fn rename_map(&self) -> Vec<(String, String)> {
        self.definitions()
            .filter_map(|(name, def)| {
                let source = def.as_column()?.source_name.as_ref()?;
                Some((source.clone(), name.to_string()))
            })
            .collect()
    }

    pub fn dtype_map(&self, scope: ValidationScope) -> Vec<(String, Dtype)> {
        self.scoped(scope)
            .filter_map(|(name, def)| Some((name.to_string(), def.dtype()?)))
            .collect()
    }

    pub fn original_dtype_map(&self) -> Vec<(String, Dtype)> {
        self.base_columns()
            .filter_map(|(name, c)| Some((name.to_string(), c.original_dtype?)))
            .collect()
    }

    pub fn nullable_conditions(&self, scope: ValidationScope) -> Vec<(String, bool)> {
        self.scoped(scope)
            .map(|(name, def)| (name.to_string(), def.nullable()))
            .collect()
    }

    pub fn original_nullable_conditions(&self) -> Vec<(String, bool)> {
        self.base_columns()
            .map(|(name, c)| (name.to_string(), c.original_nullable))
            .collect()
    }

    /// Columns whose final type is a timestamp.
    pub fn datetime_conditions(&self, scope: ValidationScope) -> Vec<(String, bool)> {
        self.scoped(scope)
            .map(|(name, def)| (name.to_string(), def.dtype() == Some(Dtype::Timestamp)))
            .collect()
    }

    pub fn original_datetime_conditions(&self) -> Vec<(String, bool)> {
        self.base_columns()
            .map(|(name, c)| (name.to_string(), c.original_dtype == Some(Dtype::Timestamp)))
            .collect()
    }

    pub fn regexp_conditions(&self, scope: ValidationScope) -> Vec<(String, RegexCondition)> {
        self.scoped(scope)
            .filter_map(|(name, _)| {
                let condition = self.inner.patterns.get(name)?;
                Some((name.to_string(), condition.clone()))
            })
            .collect()
    }

    pub fn original_regexp_conditions(&self) -> Vec<(String, RegexCondition)> {
        self.base_columns()
            .filter_map(|(name, _)| {
                let condition = self.inner.original_patterns.get(name)?;
                Some((name.to_string(), condition.clone()))
            })
            .collect()
    }

    pub fn category_conditions(&self, scope: ValidationScope) -> Vec<(String, CategoryCondition)> {
        self.scoped(scope)
            .filter_map(|(name, def)| {
                let category = def.category()?.to_vec();
                Some((name.to_string(), CategoryCondition::new(category, def.nullable())))
            })
            .collect()
    }

    pub fn original_category_conditions(&self) -> Vec<(String, CategoryCondition)> {
        self.base_columns()
            .filter_map(|(name, c)| {
                let category = c.original_category.clone()?;
                Some((
                    name.to_string(),
                    CategoryCondition::new(category, c.original_nullable),
                ))
            })
            .collect()
    }

    /// Base columns with a directly attached modifier in this phase.
    pub fn modifier_columns(&self, phase: i64) -> Vec<(&str, &Modifier)> {
        self.base_columns()
            .filter(|(_, c)| c.order == phase)
            .filter_map(|(name, c)| Some((name, c.modifier.as_ref()?)))
            .collect()
    }

    /// References merged in this phase.
    pub fn references_for(&self, phase: i64) -> Vec<(&str, &Reference)> {
        self.definitions()
            .filter_map(|(name, def)| def.as_reference().map(|r| (name, r)))
            .filter(|(_, r)| r.order == phase)
            .collect()
    }

    /// References with a modifier, merged in this phase.
    pub fn reference_modifier_columns(&self, phase: i64) -> Vec<(&str, &Modifier)> {
        self.references_for(phase)
            .into_iter()
            .filter_map(|(name, r)| Some((name, r.modifier.as_ref()?)))
            .collect()
    }

    /// Every phase that has work, ascending.
    ///
    /// The union of base column orders, reference orders and hook orders.
    pub fn orders(&self) -> BTreeSet<i64> {
        let mut orders: BTreeSet<i64> = self.base_columns().map(|(_, c)| c.order).collect();
        orders.extend(self.references_for_all().map(|(_, r)| r.order));
        orders.extend(self.inner.hooks.iter().map(|h| h.order));
        orders
    }

    fn references_for_all(&self) -> impl Iterator<Item = (&str, &Reference)> {
        self.definitions()
            .filter_map(|(name, def)| def.as_reference().map(|r| (name, r)))
    }
}

/// Collects definitions and hooks, then validates them in [`build`].
///
/// The first declaration mistake is remembered and returned by `build`.
///
/// [`build`]: SchemaBuilder::build
pub struct SchemaBuilder {
    handle: SchemaHandle,
    options: SchemaOptions,
    definitions: Vec<(String, Definition)>,
    index: BTreeMap<String, usize>,
    hooks: Vec<Hook>,
    error: Option<SchemaError>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            handle: SchemaHandle::new(name.into()),
            options: SchemaOptions::default(),
            definitions: Vec::new(),
            index: BTreeMap::new(),
            hooks: Vec::new(),
            error: None,
        }
    }

    /// The handle the built schema will carry.
    ///
    /// Lets a schema reference its own columns before it is built.
    pub fn handle(&self) -> &SchemaHandle {
        &self.handle
    }

    fn define(mut self, name: String, definition: Definition) -> Self {
        if self.index.contains_key(&name) {
            self.error
                .get_or_insert(SchemaError::DuplicateAttribute { name });
            return self;
        }
        self.index.insert(name.clone(), self.definitions.len());
        self.definitions.push((name, definition));
        self
    }

    #[must_use]
    pub fn column(self, name: impl Into<String>, column: Column) -> Self {
        self.define(name.into(), Definition::Column(column))
    }

    #[must_use]
    pub fn reference(self, name: impl Into<String>, reference: Reference) -> Self {
        self.define(name.into(), Definition::Reference(reference))
    }

    #[must_use]
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.options.sheet_name = name.into();
        self
    }

    #[must_use]
    pub fn normalize_missing(mut self, enabled: bool) -> Self {
        self.options.normalize_missing = enabled;
        self
    }

    #[must_use]
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut patterns = BTreeMap::new();
        let mut original_patterns = BTreeMap::new();
        for (name, def) in &self.definitions {
            if let Some(pattern) = def.regexp() {
                patterns.insert(name.clone(), compile(name, pattern, def.nullable())?);
            }
            match def {
                Definition::Column(c) => {
                    if let Some(pattern) = &c.original_regexp {
                        original_patterns
                            .insert(name.clone(), compile(name, pattern, c.original_nullable)?);
                    }
                }
                Definition::Reference(r) => {
                    if r.on.is_empty() {
                        return Err(SchemaError::MissingJoinKey { name: name.clone() });
                    }
                }
            }
        }

        for hook in &self.hooks {
            if hook.kind == HookKind::Filter {
                continue;
            }
            let Some(target) = &hook.target else {
                return Err(SchemaError::MissingHookTarget {
                    kind: hook.kind.to_string(),
                    hook: hook.name.clone(),
                });
            };
            if !self.index.contains_key(target) {
                return Err(SchemaError::UnknownColumn {
                    schema: self.handle.name().to_string(),
                    column: target.clone(),
                });
            }
        }

        tracing::debug!(
            schema = self.handle.name(),
            definitions = self.definitions.len(),
            hooks = self.hooks.len(),
            "schema built"
        );

        Ok(Schema {
            inner: Arc::new(SchemaInner {
                handle: self.handle,
                options: self.options,
                definitions: self.definitions,
                index: self.index,
                hooks: self.hooks,
                patterns,
                original_patterns,
            }),
        })
    }
}

fn compile(column: &str, pattern: &str, nullable: bool) -> Result<RegexCondition, SchemaError> {
    RegexCondition::new(pattern, nullable).map_err(|source| SchemaError::InvalidPattern {
        column: column.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataFrame;
    use prep_model::JoinKind;

    fn prefectures() -> Schema {
        Schema::builder("PrefectureFlow")
            .column("prefecture_id", Column::new(Dtype::Integer))
            .column("name", Column::new(Dtype::Text))
            .build()
            .unwrap()
    }

    fn users(prefectures: &Schema) -> Schema {
        let name_ref = prefectures.column_ref("name").unwrap();
        Schema::builder("UserFlow")
            .column("name", Column::new(Dtype::Text).order(1))
            .column("prefecture_id", Column::new(Dtype::Integer))
            .column("is_adult", Column::new(Dtype::Boolean))
            .reference(
                "prefecture_name",
                Reference::new(name_ref, ["prefecture_id"], JoinKind::Left).order(2),
            )
            .hook(Hook::creator_nullary("adult", "is_adult", || Ok(Value::Boolean(true))).order(3))
            .build()
            .unwrap()
    }

    #[test]
    fn classifies_columns() {
        let schema = users(&prefectures());
        assert_eq!(schema.reference_columns(), ["prefecture_name"]);
        assert_eq!(schema.creator_columns(), ["is_adult"]);
        assert_eq!(schema.additional_columns(), ["is_adult", "prefecture_name"]);
        assert_eq!(
            schema.columns(ValidationScope::BaseOnly),
            ["name", "prefecture_id"]
        );
        assert_eq!(schema.columns(ValidationScope::All).len(), 4);
    }

    #[test]
    fn orders_are_the_union_of_phases() {
        let schema = users(&prefectures());
        assert_eq!(schema.orders().into_iter().collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert_eq!(schema.references_for(2).len(), 1);
        assert!(schema.references_for(0).is_empty());
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let err = Schema::builder("S")
            .column("a", Column::new(Dtype::Text))
            .column("a", Column::new(Dtype::Integer))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAttribute { name } if name == "a"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Schema::builder("S")
            .column("a", Column::new(Dtype::Text).regexp("(unclosed"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn hook_targets_must_be_declared() {
        let err = Schema::builder("S")
            .column("a", Column::new(Dtype::Text))
            .hook(Hook::creator("b", "b", |df: &DataFrame| Ok(df.clone())))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { column, .. } if column == "b"));
    }

    #[test]
    fn column_ref_checks_name() {
        let schema = prefectures();
        assert!(schema.column_ref("name").is_ok());
        assert!(matches!(
            schema.column_ref("nope"),
            Err(SchemaError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn original_conditions_cover_base_columns_only() {
        let schema = Schema::builder("S")
            .column(
                "gender",
                Column::new(Dtype::Text)
                    .original_nullable(false)
                    .original_regexp("[a-z]+")
                    .original_category(["man", "woman"]),
            )
            .column("birthday", Column::new(Dtype::Timestamp).original_dtype(Dtype::Timestamp))
            .build()
            .unwrap();
        assert_eq!(
            schema.original_nullable_conditions(),
            [("gender".to_string(), false), ("birthday".to_string(), true)]
        );
        assert_eq!(schema.original_regexp_conditions().len(), 1);
        assert_eq!(schema.original_category_conditions().len(), 1);
        assert_eq!(
            schema.original_datetime_conditions(),
            [("gender".to_string(), false), ("birthday".to_string(), true)]
        );
        assert_eq!(schema.original_dtype_map(), [("birthday".to_string(), Dtype::Timestamp)]);
    }

    #[test]
    fn options_default_to_first_sheet() {
        let schema = prefectures();
        assert_eq!(schema.options().sheet_name, "Sheet1");
        assert!(schema.options().normalize_missing);
    }
}
