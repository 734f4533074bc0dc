//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every filter flag is optional so that values
//! from `.ga4compare.toml` apply unless overridden.

use crate::config::Variant;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ga4compare - Universal Analytics vs GA4 performance comparison
///
/// Reads a precomputed comparison table, applies date/source/medium/campaign
/// filters and renders users, sessions and transactions series per date.
///
/// Examples:
///   ga4compare --data COMPARISON.csv
///   ga4compare --data COMPARISON.csv --source google --start-date 2023-03-01
///   ga4compare --data COMPARISON.csv --format vega-lite --output charts.json
///   ga4compare --data COMPARISON.csv --list-options
///   ga4compare --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Comparison table to read
    ///
    /// Defaults to /data/in/tables/COMPARISON.csv or the config file value.
    #[arg(short, long, value_name = "FILE", env = "GA4COMPARE_DATA")]
    pub data: Option<PathBuf>,

    /// Field delimiter of the comparison table
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Source to keep ("All sources" for no constraint)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Medium to keep ("All mediums" for no constraint)
    #[arg(long, value_name = "MEDIUM")]
    pub medium: Option<String>,

    /// Campaign to keep ("All campaigns" for no constraint)
    #[arg(long, value_name = "CAMPAIGN")]
    pub campaign: Option<String>,

    /// Metric column layout of the comparison table
    #[arg(long, value_name = "VARIANT")]
    pub variant: Option<Variant>,

    /// Output file path for the report
    ///
    /// The report is written to stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, csv, vega-lite)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ga4compare.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the selectable source/medium/campaign values and exit
    #[arg(long)]
    pub list_options: bool,

    /// Exit with code 2 when the filters match no rows
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Generate a default .ga4compare.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// The full dashboard as JSON
    Json,
    /// Long-format rows: chart, date, source, value
    Csv,
    /// Vega-Lite chart specifications
    VegaLite,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
