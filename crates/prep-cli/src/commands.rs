use std::path::Path;

use anyhow::{Context, Result};
use prep_cli::report::{error_json, frame_json, frame_table, types_table};
use prep_core::{Dataset, Source, Workbook};
use prep_ingest::read_csv;
use tracing::{info, info_span};

use crate::cli::{CheckArgs, OutputFormatArg};

pub fn run_types() -> Result<()> {
    println!("{}", types_table());
    Ok(())
}

fn load_source(input: &Path) -> Result<Source> {
    if input.is_dir() {
        let book = Workbook::from_dir(input)
            .with_context(|| format!("read workbook {}", input.display()))?;
        info!(sheets = book.len(), "workbook loaded");
        Ok(book.into())
    } else {
        let frame = read_csv(input).with_context(|| format!("read {}", input.display()))?;
        Ok(frame.into())
    }
}

/// Returns whether the input passed every check.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let span = info_span!("check", input = %args.input.display());
    let _guard = span.enter();

    let schema = args.declaration().build().context("declare schema")?;
    let source = load_source(&args.input)?;

    match Dataset::construct(&schema, source, &[]) {
        Ok(dataset) => {
            match args.format {
                OutputFormatArg::Table => {
                    println!("{}", frame_table(dataset.data(), args.limit)?);
                    let rows = dataset.data().height();
                    if rows > args.limit {
                        println!("... {} more rows", rows - args.limit);
                    }
                }
                OutputFormatArg::Json => {
                    let report = frame_json(schema.name(), dataset.data())?;
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
            Ok(true)
        }
        Err(error) => {
            match args.format {
                OutputFormatArg::Table => eprintln!("{}: {error}", error.kind()),
                OutputFormatArg::Json => {
                    println!("{}", serde_json::to_string_pretty(&error_json(&error))?);
                }
            }
            Ok(false)
        }
    }
}
