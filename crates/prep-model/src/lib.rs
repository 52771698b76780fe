//! Core data model for prep-flow.
//!
//! This crate holds the declarative pieces of a schema: the type registry
//! ([`Dtype`]), owned cell values ([`Value`]), column and reference
//! descriptors, and the error taxonomy shared by every other crate.

pub mod column;
pub mod dtype;
pub mod error;
pub mod reference;
pub mod value;

pub use column::{Column, Modifier};
pub use dtype::{CastFailure, Dtype, UnknownDtype};
pub use error::{FlowError, Result, SchemaError};
pub use reference::{ColumnRef, JoinKind, Reference, SchemaHandle};
pub use value::{Value, series_from_values, series_values, values_to_series};
