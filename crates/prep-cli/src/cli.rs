//! CLI argument definitions for `prepflow`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use prep_cli::declare::{ColumnSpec, Declaration, parse_assignment};

#[derive(Parser)]
#[command(
    name = "prepflow",
    version,
    about = "Validate and type tabular data against a declared schema",
    long_about = "Validate and type tabular data against a declared schema.\n\n\
                  INPUT is a CSV file or a directory of CSV files; in a directory each\n\
                  file is a sheet named after its file stem."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Construct a dataset from INPUT and print it, or the first error.
    Check(CheckArgs),

    /// List the supported column types.
    Types,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// CSV file, or directory of CSV files.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Declare a column as NAME:TYPE (or just NAME to keep it as read).
    #[arg(long = "column", value_name = "NAME:TYPE", required = true)]
    pub columns: Vec<ColumnSpec>,

    /// Reject missing values in a column.
    #[arg(long = "not-null", value_name = "NAME")]
    pub not_null: Vec<String>,

    /// Require values of a column to match a pattern from their start.
    #[arg(long = "regex", value_name = "NAME=PATTERN", value_parser = parse_assignment)]
    pub regex: Vec<(String, String)>,

    /// Restrict a column to comma separated values.
    #[arg(long = "category", value_name = "NAME=A,B,..", value_parser = parse_assignment)]
    pub category: Vec<(String, String)>,

    /// Rename an input header to a declared column.
    #[arg(long = "rename", value_name = "SOURCE=NAME", value_parser = parse_assignment)]
    pub rename: Vec<(String, String)>,

    /// Sheet to read when INPUT is a directory.
    #[arg(long = "sheet", value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Name given to the declared schema.
    #[arg(long = "schema-name", value_name = "NAME", default_value = "Cli")]
    pub schema_name: String,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Maximum rows printed in table format.
    #[arg(long = "limit", value_name = "ROWS", default_value_t = 20)]
    pub limit: usize,
}

impl CheckArgs {
    pub fn declaration(&self) -> Declaration {
        Declaration {
            name: self.schema_name.clone(),
            columns: self.columns.clone(),
            not_null: self.not_null.clone(),
            regex: self.regex.clone(),
            category: self.category.clone(),
            rename: self.rename.clone(),
            sheet: self.sheet.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
