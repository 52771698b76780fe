//! Dataset construction pipeline with ordered step execution.
//!
//! Each step implements [`ConstructionStep`] and runs once, in order, against
//! a shared [`BuildState`].
//!
//! # Standard Pipeline Order
//!
//! 1. **ingest** - Resolve the source to a table (sheet lookup for workbooks)
//! 2. **bind_references** - Match each reference attribute to a supplied dataset
//! 3. **activate** - Mark the schema as having produced data
//! 4. **rename** - Apply `source_name` renames
//! 5. **pre_validate** - Column set plus the `original_*` constraints
//! 6. **pre_cast** - Cast to `original_dtype`
//! 7. **snapshot** - Keep the pre-transform table
//! 8. **phases** - Modifiers, creators, filters and merges, phase by phase
//! 9. **post_validate** - Every declared constraint
//! 10. **post_cast** - Cast to `dtype`
//! 11. **normalize_missing** - NaN to null (skipped when disabled)
//! 12. **reorder** - Declared columns only, in declaration order

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use prep_ingest::Source;
use prep_model::{FlowError, Modifier, Result};
use prep_transform::{
    MergeSpec, broadcast_value, cast_column, fit_to_height, merge, normalize_missing,
    rename_columns, reorder_columns,
};
use prep_validate::Validator;

use crate::dataset::Dataset;
use crate::hooks::{Hook, HookKind, HookOutput};
use crate::schema::{Schema, ValidationScope};

/// A single step of dataset construction.
pub(crate) trait ConstructionStep: Send + Sync {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()>;

    /// Name used in logs and [`ConstructionPipeline::step_names`].
    fn step_name(&self) -> &'static str;

    fn should_skip(&self, _state: &BuildState<'_>) -> bool {
        false
    }
}

/// Mutable state shared across construction steps.
pub(crate) struct BuildState<'a> {
    schema: &'a Schema,
    references: &'a [&'a Dataset],
    source: Option<Source>,
    /// Reference attribute to the dataset it merges from.
    bound: BTreeMap<String, &'a Dataset>,
    original: DataFrame,
    pre_data: Option<DataFrame>,
    data: DataFrame,
    executed_steps: Vec<&'static str>,
}

impl<'a> BuildState<'a> {
    fn new(schema: &'a Schema, source: Source, references: &'a [&'a Dataset]) -> Self {
        Self {
            schema,
            references,
            source: Some(source),
            bound: BTreeMap::new(),
            original: DataFrame::empty(),
            pre_data: None,
            data: DataFrame::empty(),
            executed_steps: Vec::new(),
        }
    }
}

/// The ordered list of construction steps.
pub struct ConstructionPipeline {
    steps: Vec<Box<dyn ConstructionStep>>,
}

impl Default for ConstructionPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl ConstructionPipeline {
    /// The pipeline every [`Dataset`] is constructed with.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Box::new(IngestStep),
                Box::new(BindReferencesStep),
                Box::new(ActivateStep),
                Box::new(RenameStep),
                Box::new(PreValidateStep),
                Box::new(PreCastStep),
                Box::new(SnapshotStep),
                Box::new(PhasesStep),
                Box::new(PostValidateStep),
                Box::new(PostCastStep),
                Box::new(NormalizeMissingStep),
                Box::new(ReorderStep),
            ],
        }
    }

    /// List step names in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }

    /// Runs every step and returns the finished dataset.
    pub fn run(
        &self,
        schema: &Schema,
        source: Source,
        references: &[&Dataset],
    ) -> Result<Dataset> {
        let span = tracing::info_span!("construct", schema = schema.name());
        let _guard = span.enter();

        let mut state = BuildState::new(schema, source, references);
        for step in &self.steps {
            if step.should_skip(&state) {
                tracing::debug!(step = step.step_name(), "step skipped");
                continue;
            }
            step.execute(&mut state)?;
            tracing::debug!(
                step = step.step_name(),
                rows = state.data.height(),
                columns = state.data.width(),
                "step finished"
            );
            state.executed_steps.push(step.step_name());
        }

        tracing::info!(
            rows = state.data.height(),
            steps = state.executed_steps.len(),
            "dataset constructed"
        );
        let pre_data = state.pre_data.unwrap_or_else(|| state.original.clone());
        Ok(Dataset::new(
            schema.clone(),
            state.original,
            pre_data,
            state.data,
        ))
    }
}

// ============================================================================
// Standard Construction Steps
// ============================================================================

struct IngestStep;

impl ConstructionStep for IngestStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        let Some(source) = state.source.take() else {
            return Ok(());
        };
        let frame = source.into_frame(&state.schema.options().sheet_name)?;
        state.original = frame.clone();
        state.data = frame;
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "ingest"
    }
}

struct BindReferencesStep;

impl ConstructionStep for BindReferencesStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        for (name, definition) in state.schema.definitions() {
            let Some(reference) = definition.as_reference() else {
                continue;
            };
            let owner = &reference.column.owner;
            if !owner.is_activated() {
                return Err(FlowError::ReferenceDataNotInitialization {
                    name: name.to_string(),
                });
            }
            let candidates = state.references.iter().copied();
            let dataset = candidates
                .clone()
                .find(|d| d.schema().handle().same_schema(owner))
                .or_else(|| candidates.clone().find(|d| d.schema().name() == owner.name()))
                .ok_or_else(|| FlowError::ReferenceDataNotFound {
                    name: owner.name().to_string(),
                })?;
            state.bound.insert(name.to_string(), dataset);
        }
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "bind_references"
    }
}

struct ActivateStep;

impl ConstructionStep for ActivateStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        state.schema.handle().activate();
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "activate"
    }
}

struct RenameStep;

impl ConstructionStep for RenameStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        rename_columns(&mut state.data, &state.schema.rename_map())?;
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "rename"
    }
}

struct PreValidateStep;

impl ConstructionStep for PreValidateStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        let schema = state.schema;
        let base = schema.columns(ValidationScope::BaseOnly);
        let validator = Validator::new(&state.data);
        validator.necessary_columns(&base)?;
        validator.unnecessary_columns(&base)?;
        validator.nullable(&schema.original_nullable_conditions())?;
        validator.datetime(&schema.original_datetime_conditions())?;
        validator.regexp(&schema.original_regexp_conditions())?;
        validator.category(&schema.original_category_conditions())
    }

    fn step_name(&self) -> &'static str {
        "pre_validate"
    }
}

struct PreCastStep;

impl ConstructionStep for PreCastStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        for (name, dtype) in state.schema.original_dtype_map() {
            cast_column(&mut state.data, &name, dtype)?;
        }
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "pre_cast"
    }
}

struct SnapshotStep;

impl ConstructionStep for SnapshotStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        state.pre_data = Some(state.data.clone());
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "snapshot"
    }
}

/// Runs every phase in ascending order.
///
/// Within a phase: column modifiers, modifier hooks on non-reference
/// columns, creators, filters, reference merges, reference modifiers,
/// modifier hooks on reference columns, then `after_merge` creators and
/// filters.
struct PhasesStep;

impl ConstructionStep for PhasesStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        let schema = state.schema;
        for phase in schema.orders() {
            tracing::debug!(phase, rows = state.data.height(), "phase started");

            for (name, modifier) in schema.modifier_columns(phase) {
                apply_modifier(&mut state.data, name, modifier)?;
            }
            for hook in schema.hooks_for(HookKind::Modifier, phase) {
                if !targets_reference(schema, hook) {
                    run_modifier_hook(schema, &mut state.data, hook)?;
                }
            }
            run_creators(state, phase, false)?;
            run_filters(state, phase, false)?;

            for (name, reference) in schema.references_for(phase) {
                let Some(dataset) = state.bound.get(name) else {
                    return Err(FlowError::ReferenceDataNotFound {
                        name: reference.column.owner.name().to_string(),
                    });
                };
                let spec = MergeSpec {
                    keys: reference.on.clone(),
                    how: reference.how,
                    columns: vec![(reference.column.column.clone(), name.to_string())],
                };
                state.data = merge(&state.data, dataset.data(), &spec)?;
            }
            for (name, modifier) in schema.reference_modifier_columns(phase) {
                apply_modifier(&mut state.data, name, modifier)?;
            }
            for hook in schema.hooks_for(HookKind::Modifier, phase) {
                if targets_reference(schema, hook) {
                    run_modifier_hook(schema, &mut state.data, hook)?;
                }
            }

            run_creators(state, phase, true)?;
            run_filters(state, phase, true)?;
        }
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "phases"
    }
}

struct PostValidateStep;

impl ConstructionStep for PostValidateStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        validate_frame(state.schema, &state.data, ValidationScope::All)
    }

    fn step_name(&self) -> &'static str {
        "post_validate"
    }
}

struct PostCastStep;

impl ConstructionStep for PostCastStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        for (name, dtype) in state.schema.dtype_map(ValidationScope::All) {
            cast_column(&mut state.data, &name, dtype)?;
        }
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "post_cast"
    }
}

struct NormalizeMissingStep;

impl ConstructionStep for NormalizeMissingStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        normalize_missing(&mut state.data)
    }

    fn step_name(&self) -> &'static str {
        "normalize_missing"
    }

    fn should_skip(&self, state: &BuildState<'_>) -> bool {
        !state.schema.options().normalize_missing
    }
}

struct ReorderStep;

impl ConstructionStep for ReorderStep {
    fn execute(&self, state: &mut BuildState<'_>) -> Result<()> {
        state.data = reorder_columns(&state.data, &state.schema.columns(ValidationScope::All))?;
        Ok(())
    }

    fn step_name(&self) -> &'static str {
        "reorder"
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Runs the post-transform checks for `scope` against `df`.
pub(crate) fn validate_frame(schema: &Schema, df: &DataFrame, scope: ValidationScope) -> Result<()> {
    let columns = schema.columns(scope);
    let validator = Validator::new(df);
    validator.necessary_columns(&columns)?;
    validator.unnecessary_columns(&columns)?;
    validator.nullable(&schema.nullable_conditions(scope))?;
    validator.datetime(&schema.datetime_conditions(scope))?;
    validator.regexp(&schema.regexp_conditions(scope))?;
    validator.category(&schema.category_conditions(scope))
}

fn targets_reference(schema: &Schema, hook: &Hook) -> bool {
    hook.target
        .as_deref()
        .is_some_and(|target| schema.is_reference(target))
}

fn hook_target(hook: &Hook) -> Result<&str> {
    hook.target.as_deref().ok_or_else(|| FlowError::Decorator {
        column: hook.name.clone(),
        detail: format!("{} hook has no target column", hook.kind),
    })
}

fn apply_modifier(data: &mut DataFrame, name: &str, modifier: &Modifier) -> Result<()> {
    let Ok(column) = data.column(name) else {
        return Err(FlowError::Decorator {
            column: name.to_string(),
            detail: "modifier target is not in the table".to_string(),
        });
    };
    let modified = modifier
        .apply(column.as_materialized_series())
        .map_err(|source| FlowError::Hook {
            hook: format!("{name}.modifier"),
            source,
        })?;
    let height = data.height();
    let series = fit_to_height(modified, name, height).map_err(|len| {
        FlowError::DecoratorReturnType {
            hook: format!("{name}.modifier"),
            detail: format!("returned {len} values for {height} rows"),
        }
    })?;
    data.with_column(series)?;
    Ok(())
}

fn run_modifier_hook(schema: &Schema, data: &mut DataFrame, hook: &Hook) -> Result<()> {
    let target = hook_target(hook)?;
    if !schema.is_reference(target) && schema.is_additional(target) {
        return Err(FlowError::Decorator {
            column: target.to_string(),
            detail: format!("modifier '{}' must target a base column", hook.name),
        });
    }
    if data.column(target).is_err() {
        return Err(FlowError::Decorator {
            column: target.to_string(),
            detail: format!("modifier '{}' targets a column not in the table", hook.name),
        });
    }
    let output = invoke(hook, data)?;
    assign(data, hook, target, output)
}

fn run_creators(state: &mut BuildState<'_>, phase: i64, after_merge: bool) -> Result<()> {
    let schema = state.schema;
    for hook in schema
        .hooks_for(HookKind::Creator, phase)
        .filter(|h| h.after_merge == after_merge)
    {
        let target = hook_target(hook)?;
        if schema.is_reference(target) {
            return Err(FlowError::Decorator {
                column: target.to_string(),
                detail: format!("creator '{}' cannot target a reference column", hook.name),
            });
        }
        let output = invoke(hook, &state.data)?;
        assign(&mut state.data, hook, target, output)?;
    }
    Ok(())
}

fn run_filters(state: &mut BuildState<'_>, phase: i64, after_merge: bool) -> Result<()> {
    let schema = state.schema;
    for hook in schema
        .hooks_for(HookKind::Filter, phase)
        .filter(|h| h.after_merge == after_merge)
    {
        let before = state.data.height();
        match invoke(hook, &state.data)? {
            HookOutput::Frame(frame) => state.data = frame,
            other => {
                return Err(FlowError::DecoratorReturnType {
                    hook: hook.name.clone(),
                    detail: format!("filter must return a table, got {}", other.shape_name()),
                });
            }
        }
        tracing::debug!(
            hook = %hook.name,
            before,
            after = state.data.height(),
            "filter applied"
        );
    }
    Ok(())
}

fn invoke(hook: &Hook, data: &DataFrame) -> Result<HookOutput> {
    hook.call(data).map_err(|source| FlowError::Hook {
        hook: hook.name.clone(),
        source,
    })
}

/// Writes a creator or modifier result into `target`.
fn assign(data: &mut DataFrame, hook: &Hook, target: &str, output: HookOutput) -> Result<()> {
    let height = data.height();
    let series = match output {
        HookOutput::Series(series) => fit_to_height(series, target, height).map_err(|len| {
            FlowError::DecoratorReturnType {
                hook: hook.name.clone(),
                detail: format!("returned {len} values for {height} rows"),
            }
        })?,
        HookOutput::Scalar(value) => broadcast_value(target, &value, height).map_err(|failure| {
            FlowError::DecoratorReturnType {
                hook: hook.name.clone(),
                detail: failure.to_string(),
            }
        })?,
        HookOutput::Frame(_) => {
            return Err(FlowError::DecoratorReturnType {
                hook: hook.name.clone(),
                detail: format!("{} must return a column or a scalar, got a table", hook.kind),
            });
        }
    };
    data.with_column(series)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_step_order() {
        insta::assert_debug_snapshot!(ConstructionPipeline::standard().step_names(), @r#"
        [
            "ingest",
            "bind_references",
            "activate",
            "rename",
            "pre_validate",
            "pre_cast",
            "snapshot",
            "phases",
            "post_validate",
            "post_cast",
            "normalize_missing",
            "reorder",
        ]
        "#);
    }
}
