//! Input sources for prep-flow.
//!
//! A dataset is constructed from a [`Source`]: either a single in-memory
//! frame or a [`Workbook`] of named sheets, from which the schema's
//! configured sheet is selected.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use prep_ingest::{Source, Workbook, read_csv};
//!
//! // A single CSV file, every column read as text
//! let users: Source = read_csv(Path::new("data/users.csv"))?.into();
//!
//! // A directory of CSV files, one sheet per file stem
//! let book: Source = Workbook::from_dir(Path::new("data"))?.into();
//! ```

mod csv;
mod error;
mod source;
mod workbook;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{CsvOptions, read_csv, read_csv_with};

// === Sources ===
pub use source::Source;
pub use workbook::{Workbook, list_csv_files};
