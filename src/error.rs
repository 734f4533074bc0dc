//! Error types for loading and aggregating the comparison table.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a render pass while reading the comparison table.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The file could not be opened or read.
    #[error("Failed to read comparison table at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The delimited structure is broken (ragged row, bad quoting, bad encoding).
    #[error("Malformed comparison table at {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    /// A required column is absent from the header row.
    #[error("Comparison table at {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    /// The header row names the same column more than once.
    #[error("Comparison table at {path} has duplicate column '{column}'")]
    DuplicateColumn { path: PathBuf, column: String },
    /// A `date` cell could not be parsed as a calendar date.
    #[error("Invalid date '{value}' on line {line} of {path}")]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

/// Errors raised by the analysis stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configured metric column does not exist in the table.
    #[error("Unknown metric column '{0}'")]
    UnknownMetric(String),
}
