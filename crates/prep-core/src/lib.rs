//! Schema registry and dataset construction for prep-flow.
//!
//! Declare a [`Schema`] with [`Schema::builder`], then build validated
//! [`Dataset`]s from raw tables with [`Dataset::construct`]:
//!
//! ```
//! use polars::prelude::*;
//! use prep_core::{Column, Dataset, Dtype, Schema};
//!
//! let schema = Schema::builder("UserFlow")
//!     .column("age", Column::new(Dtype::Integer).nullable(false))
//!     .build()
//!     .unwrap();
//! let raw = DataFrame::new(vec![Series::new("age".into(), vec!["28", "26"]).into()]).unwrap();
//!
//! let users = Dataset::construct(&schema, raw, &[]).unwrap();
//! assert_eq!(users.data().column("age").unwrap().dtype(), &DataType::Int64);
//! ```

pub mod dataset;
pub mod hooks;
mod pipeline;
pub mod schema;

pub use dataset::Dataset;
pub use hooks::{Hook, HookBody, HookKind, HookOutput};
pub use pipeline::ConstructionPipeline;
pub use schema::{Definition, Schema, SchemaBuilder, SchemaOptions, ValidationScope};

pub use prep_ingest::{Source, Workbook};
pub use prep_model::{
    Column, ColumnRef, Dtype, FlowError, JoinKind, Modifier, Reference, Result, SchemaError,
    SchemaHandle, Value,
};
pub use prep_validate::{CategoryCondition, RegexCondition};
