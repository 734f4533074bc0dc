//! Data models for the comparison pipeline.
//!
//! This module contains the core data structures shared by the loader,
//! the analysis stages and the report generator: the comparison table,
//! filter selections and the aggregated/long-format series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Categorical column that can be constrained by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Source,
    Medium,
    Campaign,
}

impl Dimension {
    /// All filterable dimensions, in display order.
    pub const ALL: [Dimension; 3] = [Dimension::Source, Dimension::Medium, Dimension::Campaign];

    /// Column name in the comparison table.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Source => "source",
            Dimension::Medium => "medium",
            Dimension::Campaign => "campaign",
        }
    }

    /// Plural label used in the "All ..." sentinel.
    pub fn plural(&self) -> &'static str {
        match self {
            Dimension::Source => "sources",
            Dimension::Medium => "mediums",
            Dimension::Campaign => "campaigns",
        }
    }

    /// The sentinel option meaning "no constraint", e.g. `All sources`.
    pub fn sentinel(&self) -> String {
        format!("All {}", self.plural())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A single dimension constraint: either the sentinel or an exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// No constraint on this dimension.
    #[default]
    All,
    /// Keep only rows whose dimension equals this value.
    Value(String),
}

impl Selection {
    /// Interpret user input for a dimension.
    ///
    /// Only the sentinel text (`All sources`, ...) means "no constraint";
    /// anything else, including an empty string, is an exact-match value.
    pub fn from_input(dimension: Dimension, input: &str) -> Self {
        if input == dimension.sentinel() {
            Selection::All
        } else {
            Selection::Value(input.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Value(expected) => expected == value,
        }
    }

    #[allow(dead_code)] // Convenience for callers inspecting selections
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Label as it would be shown in a select box.
    pub fn label(&self, dimension: Dimension) -> String {
        match self {
            Selection::All => dimension.sentinel(),
            Selection::Value(value) => value.clone(),
        }
    }
}

/// The filters chosen for one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Inclusive lower date bound.
    pub start_date: NaiveDate,
    /// Inclusive upper date bound. Not required to be after `start_date`.
    pub end_date: NaiveDate,
    pub source: Selection,
    pub medium: Selection,
    pub campaign: Selection,
}

impl FilterSelection {
    /// A selection covering the date range with every dimension unconstrained.
    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            source: Selection::All,
            medium: Selection::All,
            campaign: Selection::All,
        }
    }

    /// Returns the constraint for a dimension.
    pub fn get(&self, dimension: Dimension) -> &Selection {
        match dimension {
            Dimension::Source => &self.source,
            Dimension::Medium => &self.medium,
            Dimension::Campaign => &self.campaign,
        }
    }

    /// Returns a copy with one dimension constraint replaced.
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        match dimension {
            Dimension::Source => self.source = selection,
            Dimension::Medium => self.medium = selection,
            Dimension::Campaign => self.campaign = selection,
        }
        self
    }

    /// Whether `date` falls in the inclusive range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::between(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(NaiveDate::MIN),
        )
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}, {}, {}, {}",
            self.start_date,
            self.end_date,
            self.source.label(Dimension::Source),
            self.medium.label(Dimension::Medium),
            self.campaign.label(Dimension::Campaign)
        )
    }
}

/// One observation of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub date: NaiveDate,
    pub source: String,
    pub medium: String,
    pub campaign: String,
    /// Metric values aligned with `Table::metric_columns`.
    /// `None` marks an empty or non-numeric cell.
    pub metrics: Vec<Option<f64>>,
}

impl Row {
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Source => &self.source,
            Dimension::Medium => &self.medium,
            Dimension::Campaign => &self.campaign,
        }
    }
}

/// The loaded comparison table.
///
/// A table is never mutated after construction; filtering produces a new
/// table sharing the same metric column layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    metric_columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(metric_columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            metric_columns,
            rows,
        }
    }

    /// Metric column names in file order.
    pub fn metric_columns(&self) -> &[String] {
        &self.metric_columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a metric column, if the table has it.
    pub fn metric_index(&self, column: &str) -> Option<usize> {
        self.metric_columns.iter().position(|c| c == column)
    }

    /// Sum of a metric column over all rows, missing cells counted as zero.
    #[allow(dead_code)] // Used to cross-check aggregates
    pub fn metric_total(&self, column: &str) -> Option<f64> {
        let idx = self.metric_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.metrics.get(idx).copied().flatten().unwrap_or(0.0))
                .sum(),
        )
    }

    /// Build a table with the same layout holding only the given rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            metric_columns: self.metric_columns.clone(),
            rows,
        }
    }
}

/// Per-date sums for a list of metric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedSeries {
    columns: Vec<String>,
    values: BTreeMap<NaiveDate, Vec<f64>>,
}

impl AggregatedSeries {
    pub fn new(columns: Vec<String>, values: BTreeMap<NaiveDate, Vec<f64>>) -> Self {
        Self { columns, values }
    }

    /// Column names in the order they were requested.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Dates present in the series, ascending. Dates without rows are absent.
    #[allow(dead_code)] // Accessor for consumers that only need the axis
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.values.keys()
    }

    /// Iterate `(date, sums)` pairs in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<f64>)> {
        self.values.iter()
    }

    #[allow(dead_code)] // Point lookup
    pub fn get(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(&date).and_then(|sums| sums.get(idx).copied())
    }

    /// Number of dates in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of one column across all dates.
    pub fn column_total(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.values.values().map(|sums| sums[idx]).sum())
    }
}

/// One `(date, series, value)` triple of a long-format table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub date: NaiveDate,
    pub series: String,
    pub value: f64,
}

/// Long-format series ready for a chart renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTable {
    /// Label of the value column (the series column is always `source`).
    pub value_name: String,
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every value in the table.
    #[allow(dead_code)] // Used to cross-check reshaping
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}
