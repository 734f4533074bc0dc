//! Report rendering for a built dashboard.

pub mod charts;
pub mod generator;

pub use charts::generate_vega_lite_report;
pub use generator::{generate_csv_report, generate_json_report, generate_markdown_report};

use crate::cli::OutputFormat;
use crate::dashboard::Dashboard;
use anyhow::Result;

/// Render a dashboard in the requested format.
pub fn render(dashboard: &Dashboard, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(dashboard)),
        OutputFormat::Json => generate_json_report(dashboard),
        OutputFormat::Csv => generate_csv_report(dashboard),
        OutputFormat::VegaLite => generate_vega_lite_report(dashboard),
    }
}
