//! Constructed datasets.

use polars::prelude::DataFrame;
use prep_ingest::Source;
use prep_model::Result;

use crate::pipeline::{ConstructionPipeline, validate_frame};
use crate::schema::{Schema, ValidationScope};

/// One validated table plus its provenance.
///
/// Construction either succeeds completely or fails with the first error;
/// a `Dataset` is never partially built. Its tables are immutable.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    original: DataFrame,
    pre_data: DataFrame,
    data: DataFrame,
}

impl Dataset {
    pub(crate) fn new(
        schema: Schema,
        original: DataFrame,
        pre_data: DataFrame,
        data: DataFrame,
    ) -> Self {
        Self {
            schema,
            original,
            pre_data,
            data,
        }
    }

    /// Ingests, validates and transforms `source` according to `schema`.
    ///
    /// `references` supplies the datasets that the schema's references merge
    /// from; each is matched by the name of the schema that built it.
    pub fn construct(
        schema: &Schema,
        source: impl Into<Source>,
        references: &[&Dataset],
    ) -> Result<Self> {
        ConstructionPipeline::standard().run(schema, source.into(), references)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The table as ingested, before renaming.
    pub fn original(&self) -> &DataFrame {
        &self.original
    }

    /// The table after renaming, pre-validation and pre-casting.
    pub fn pre_data(&self) -> &DataFrame {
        &self.pre_data
    }

    /// The final table.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }

    /// Re-runs the post-transform checks on the final table.
    ///
    /// With [`ValidationScope::BaseOnly`] the table is first projected onto
    /// the base columns, so reference and creator columns are ignored.
    pub fn validate(&self, scope: ValidationScope) -> Result<()> {
        match scope {
            ValidationScope::All => validate_frame(&self.schema, &self.data, scope),
            ValidationScope::BaseOnly => {
                let base = self.data.select(self.schema.columns(scope))?;
                validate_frame(&self.schema, &base, scope)
            }
        }
    }
}
