//! Report generation.
//!
//! This module renders a [`Dashboard`] as Markdown tables, JSON or a
//! long-format CSV.

use crate::dashboard::{Chart, Dashboard, DashboardMetadata, FilterOptions, SERIES_NAME};
use crate::models::{Dimension, FilterSelection};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", dashboard.metadata.title));

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));
    output.push_str(&generate_filters_section(
        &dashboard.selection,
        &dashboard.options,
    ));
    output.push_str(&generate_warnings_section(dashboard));

    output.push_str("## Charts\n\n");
    for chart in &dashboard.charts {
        output.push_str(&generate_chart_section(chart));
    }

    output.push_str(&generate_footer(&dashboard.metadata));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data File:** `{}`\n", metadata.data_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Layout:** {}\n", metadata.variant));
    section.push_str(&format!(
        "- **Rows Matched:** {} of {}\n",
        metadata.rows_matched, metadata.rows_total
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Filters](#filters)\n");

    if !dashboard.warnings.is_empty() {
        toc.push_str("- [Warnings](#warnings)\n");
    }

    toc.push_str("- [Charts](#charts)\n");
    for chart in &dashboard.charts {
        toc.push_str(&format!("  - [{}](#{})\n", chart.title, anchor(&chart.title)));
    }

    toc.push('\n');

    toc
}

/// Generate the filters section: the active selection and the options.
fn generate_filters_section(selection: &FilterSelection, options: &FilterOptions) -> String {
    let mut section = String::new();

    section.push_str("## Filters\n\n");
    section.push_str("| Filter | Selected | Options |\n");
    section.push_str("|:---|:---|:---:|\n");
    section.push_str(&format!(
        "| Date Range | {} to {} | |\n",
        selection.start_date, selection.end_date
    ));

    for dimension in Dimension::ALL {
        // The sentinel is not counted as an option
        let available = options.get(dimension).len().saturating_sub(1);
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            capitalize(dimension.column()),
            selection.get(dimension).label(dimension),
            available
        ));
    }
    section.push('\n');

    section
}

/// Generate the warnings section, if any.
fn generate_warnings_section(dashboard: &Dashboard) -> String {
    if dashboard.warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Warnings\n\n");
    for warning in &dashboard.warnings {
        section.push_str(&format!("- ⚠️ {}\n", warning));
    }
    section.push('\n');

    section
}

/// Generate the section for one chart: totals, then one row per date.
fn generate_chart_section(chart: &Chart) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {}\n\n", chart.title));
    section.push_str(&format!(
        "*{} chart | Y axis: {} | Points: {}*\n\n",
        capitalize(chart.kind.mark()),
        chart.y_title,
        chart.data.rows.len()
    ));

    if chart.data.is_empty() {
        section.push_str("No data matches the selected filters.\n\n");
        return section;
    }

    section.push_str("| Series | Total |\n");
    section.push_str("|:---|---:|\n");
    for total in &chart.totals {
        section.push_str(&format!(
            "| `{}` | {} |\n",
            total.series,
            format_value(total.total)
        ));
    }
    section.push('\n');

    // Wide table: date then one column per series
    section.push_str("| Date |");
    for series in &chart.series {
        section.push_str(&format!(" {} |", series));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(chart.series.len()));
    section.push('\n');

    for (date, values) in pivot(chart) {
        section.push_str(&format!("| {} |", date));
        for series in &chart.series {
            let cell = values
                .get(series.as_str())
                .map(|v| format_value(*v))
                .unwrap_or_default();
            section.push_str(&format!(" {} |", cell));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer(metadata: &DashboardMetadata) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Version: {} | Report generated by ga4compare*\n",
        metadata.version
    ));

    footer
}

/// Group a chart's long rows back into per-date values.
fn pivot(chart: &Chart) -> BTreeMap<NaiveDate, HashMap<&str, f64>> {
    let mut grouped: BTreeMap<NaiveDate, HashMap<&str, f64>> = BTreeMap::new();

    for row in &chart.data.rows {
        grouped
            .entry(row.date)
            .or_default()
            .insert(row.series.as_str(), row.value);
    }

    grouped
}

fn anchor(title: &str) -> String {
    title.replace([' ', '/', '.'], "-").to_lowercase()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Counts print without decimals; anything fractional gets two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Generate a long-format CSV of every chart: `chart,date,source,value`.
pub fn generate_csv_report(dashboard: &Dashboard) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let value_name = dashboard
        .charts
        .first()
        .map(|c| c.data.value_name.as_str())
        .unwrap_or("value");
    writer.write_record(["chart", "date", SERIES_NAME, value_name])?;

    for chart in &dashboard.charts {
        for row in &chart.data.rows {
            let date = row.date.to_string();
            let value = row.value.to_string();
            writer.write_record([
                chart.title.as_str(),
                date.as_str(),
                row.series.as_str(),
                value.as_str(),
            ])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Failed to flush CSV report: {}", err.error()))?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}
