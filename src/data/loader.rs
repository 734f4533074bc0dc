//! Comparison table loader.
//!
//! Reads a delimited file with a header row into a [`Table`]. The four
//! dimension columns (`date`, `source`, `medium`, `campaign`) are required;
//! every other column is kept as a metric column in file order.

use crate::error::DataLoadError;
use crate::models::{Row, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Columns every comparison table must have.
pub const DIMENSION_COLUMNS: [&str; 4] = ["date", "source", "medium", "campaign"];

/// Options controlling how the table is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Metric columns that must be present in addition to the dimensions.
    pub required_metrics: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            required_metrics: Vec::new(),
        }
    }
}

/// Load a comparison table requiring only the dimension columns.
#[allow(dead_code)] // Convenience wrapper over load_with
pub fn load(path: &Path) -> Result<Table, DataLoadError> {
    load_with(path, &LoadOptions::default())
}

/// Load a comparison table with explicit options.
pub fn load_with(path: &Path, options: &LoadOptions) -> Result<Table, DataLoadError> {
    info!("Loading comparison table from {}", path.display());

    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_table(BufReader::new(file), path, options)?;

    info!(
        "Loaded {} rows with {} metric columns",
        table.len(),
        table.metric_columns().len()
    );
    Ok(table)
}

/// Parse a table from any reader. `path` is only used in error messages.
pub fn read_table<R: Read>(
    reader: R,
    path: &Path,
    options: &LoadOptions,
) -> Result<Table, DataLoadError> {
    let csv_error = |source: csv::Error| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut seen = HashSet::new();
    if let Some(column) = headers.iter().find(|h| !seen.insert(*h)) {
        return Err(DataLoadError::DuplicateColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }

    let find = |name: &str| -> Result<usize, DataLoadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };

    let date_idx = find("date")?;
    let source_idx = find("source")?;
    let medium_idx = find("medium")?;
    let campaign_idx = find("campaign")?;

    for column in &options.required_metrics {
        find(column)?;
    }

    let (metric_idx, metric_columns): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !DIMENSION_COLUMNS.contains(name))
        .map(|(idx, name)| (idx, name.to_string()))
        .unzip();

    debug!("Metric columns: {:?}", metric_columns);

    let mut rows = Vec::new();
    let mut missing_cells = 0usize;

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_date = field(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| DataLoadError::InvalidDate {
            path: path.to_path_buf(),
            line: record.position().map(|p| p.line()).unwrap_or(0),
            value: raw_date.to_string(),
        })?;

        let metrics: Vec<Option<f64>> = metric_idx
            .iter()
            .map(|&idx| parse_metric(field(idx)))
            .collect();
        missing_cells += metrics.iter().filter(|m| m.is_none()).count();

        rows.push(Row {
            date,
            source: field(source_idx).to_string(),
            medium: field(medium_idx).to_string(),
            campaign: field(campaign_idx).to_string(),
            metrics,
        });
    }

    if missing_cells > 0 {
        debug!(
            "{} metric cells were empty or non-numeric and will not contribute to sums",
            missing_cells
        );
    }

    Ok(Table::new(metric_columns, rows))
}

/// Parse a `date` cell, discarding any time-of-day component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Parse a metric cell. Empty, non-numeric and non-finite cells are `None`.
pub fn parse_metric(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Path of the sample table shipped with the repository.
#[cfg(test)]
pub fn fixture_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/comparison.csv")
}
