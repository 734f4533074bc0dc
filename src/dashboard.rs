//! Dashboard assembly.
//!
//! One render pass: derive the filter options from the full table, filter
//! it, then aggregate and reshape each metric family into a chart.

use crate::analysis::{aggregate, distinct_values, filter, reshape_long};
use crate::config::{MetricFamily, MetricsConfig, Variant};
use crate::error::PipelineError;
use crate::models::{Dimension, FilterSelection, LongTable, Selection, Table};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Dashboard title.
pub const TITLE: &str = "Google Universal Analytics vs GA4 performance comparison";

/// Label of the series column in long-format data.
pub const SERIES_NAME: &str = "source";

/// Label of the value column in long-format data.
pub const VALUE_NAME: &str = "value";

/// Selectable values for each filter, sentinel first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub sources: Vec<String>,
    pub mediums: Vec<String>,
    pub campaigns: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &Table) -> Self {
        Self {
            sources: distinct_values(table, Dimension::Source),
            mediums: distinct_values(table, Dimension::Medium),
            campaigns: distinct_values(table, Dimension::Campaign),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Source => &self.sources,
            Dimension::Medium => &self.mediums,
            Dimension::Campaign => &self.campaigns,
        }
    }
}

/// How a chart draws its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

impl ChartKind {
    pub fn mark(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
        }
    }
}

/// Sum of one series over the whole filtered range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTotal {
    pub series: String,
    pub total: f64,
}

/// Chart-ready data for one metric family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    /// Y-axis title.
    pub y_title: String,
    /// Series names in drawing order.
    pub series: Vec<String>,
    pub totals: Vec<SeriesTotal>,
    pub data: LongTable,
}

/// Non-fatal conditions detected during a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineWarning {
    /// The filters matched no rows; every chart is empty.
    EmptyResult,
    /// The start date is after the end date.
    InvertedDateRange,
    /// A selected dimension value does not occur in the table.
    UnknownValue { dimension: Dimension, value: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::EmptyResult => {
                write!(f, "No rows match the selected filters; charts are empty")
            }
            PipelineWarning::InvertedDateRange => {
                write!(f, "Start date is after end date")
            }
            PipelineWarning::UnknownValue { dimension, value } => {
                write!(f, "{} '{}' does not occur in the table", dimension, value)
            }
        }
    }
}

/// Metadata about a render pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub title: String,
    pub data_path: String,
    pub generated_at: DateTime<Utc>,
    pub variant: Variant,
    pub rows_total: usize,
    pub rows_matched: usize,
    pub version: String,
}

/// Everything a renderer needs for one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub selection: FilterSelection,
    pub options: FilterOptions,
    pub charts: Vec<Chart>,
    pub warnings: Vec<PipelineWarning>,
}

impl Dashboard {
    /// True when the filters matched no rows.
    pub fn is_empty(&self) -> bool {
        self.metadata.rows_matched == 0
    }
}

/// Run the full pipeline over an already loaded table.
pub fn build_dashboard(
    table: &Table,
    selection: &FilterSelection,
    metrics: &MetricsConfig,
    data_path: &str,
) -> Result<Dashboard, PipelineError> {
    let options = FilterOptions::from_table(table);
    let mut warnings = Vec::new();

    if selection.start_date > selection.end_date {
        warnings.push(PipelineWarning::InvertedDateRange);
    }
    for dimension in Dimension::ALL {
        if let Selection::Value(value) = selection.get(dimension) {
            if !options.get(dimension)[1..].contains(value) {
                warnings.push(PipelineWarning::UnknownValue {
                    dimension,
                    value: value.clone(),
                });
            }
        }
    }

    let filtered = filter(table, selection);
    if filtered.is_empty() {
        warnings.push(PipelineWarning::EmptyResult);
    }

    let mut charts = Vec::new();
    for family in metrics.effective_families() {
        let y_title = family.title.clone();
        charts.push(build_chart(&filtered, &family, ChartKind::Line, &y_title)?);
    }
    charts.push(build_chart(
        &filtered,
        &metrics.effective_recalculated(),
        ChartKind::Bar,
        "Value",
    )?);

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(Dashboard {
        metadata: DashboardMetadata {
            title: TITLE.to_string(),
            data_path: data_path.to_string(),
            generated_at: Utc::now(),
            variant: metrics.variant,
            rows_total: table.len(),
            rows_matched: filtered.len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        selection: selection.clone(),
        options,
        charts,
        warnings,
    })
}

fn build_chart(
    filtered: &Table,
    family: &MetricFamily,
    kind: ChartKind,
    y_title: &str,
) -> Result<Chart, PipelineError> {
    let aggregated = aggregate(filtered, &family.columns)?;
    let totals = family
        .columns
        .iter()
        .map(|column| SeriesTotal {
            series: column.clone(),
            total: aggregated.column_total(column).unwrap_or(0.0),
        })
        .collect();
    let data = reshape_long(&aggregated, VALUE_NAME);

    debug!(
        "Chart '{}': {} dates, {} points",
        family.title,
        aggregated.len(),
        data.rows.len()
    );

    Ok(Chart {
        title: family.title.clone(),
        kind,
        y_title: y_title.to_string(),
        series: family.columns.clone(),
        totals,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixture_path, load, read_table, LoadOptions};
    use std::path::Path;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn fixture() -> Table {
        load(&fixture_path()).unwrap()
    }

    fn total(chart: &Chart, series: &str) -> f64 {
        chart
            .totals
            .iter()
            .find(|t| t.series == series)
            .map(|t| t.total)
            .unwrap()
    }

    #[test]
    fn test_build_dashboard_defaults() {
        let table = fixture();
        let dashboard = build_dashboard(
            &table,
            &FilterSelection::default(),
            &MetricsConfig::default(),
            "fixtures/comparison.csv",
        )
        .unwrap();

        assert_eq!(dashboard.metadata.rows_total, 6);
        assert_eq!(dashboard.metadata.rows_matched, 6);
        assert!(dashboard.warnings.is_empty());

        let titles: Vec<&str> = dashboard.charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Users",
                "Sessions",
                "Transactions",
                "GA4 metrics recalculated to GA UA methodology"
            ]
        );
        assert_eq!(dashboard.charts[0].kind, ChartKind::Line);
        assert_eq!(dashboard.charts[3].kind, ChartKind::Bar);
        assert_eq!(dashboard.charts[3].y_title, "Value");

        let users = &dashboard.charts[0];
        assert_eq!(total(users, "ua_users"), 39.0);
        assert_eq!(total(users, "ga4api_users"), 41.0);
        // The empty ga4export cell on 2023-01-02 does not contribute
        assert_eq!(total(users, "ga4export_users"), 34.0);
        // 4 dates x 4 series
        assert_eq!(users.data.rows.len(), 16);
        assert_eq!(users.data.rows[0].date, date(1));
    }

    #[test]
    fn test_options_come_from_full_table() {
        let table = fixture();
        let selection = FilterSelection::default()
            .with(Dimension::Source, Selection::Value("bing".to_string()));
        let dashboard =
            build_dashboard(&table, &selection, &MetricsConfig::default(), "").unwrap();

        assert_eq!(dashboard.metadata.rows_matched, 1);
        assert_eq!(
            dashboard.options.sources,
            vec!["All sources", "google", "bing", "newsletter"]
        );
        assert_eq!(
            dashboard.options.mediums,
            vec!["All mediums", "cpc", "organic", "email"]
        );
        assert_eq!(
            dashboard.options.campaigns,
            vec!["All campaigns", "brand", "(not set)", "spring_sale"]
        );
    }

    #[test]
    fn test_empty_result_is_a_warning() {
        let table = fixture();
        let selection = FilterSelection::between(date(20), date(10));
        let dashboard =
            build_dashboard(&table, &selection, &MetricsConfig::default(), "").unwrap();

        assert!(dashboard.is_empty());
        assert_eq!(
            dashboard.warnings,
            vec![
                PipelineWarning::InvertedDateRange,
                PipelineWarning::EmptyResult
            ]
        );
        assert_eq!(dashboard.charts.len(), 4);
        assert!(dashboard.charts.iter().all(|c| c.data.is_empty()));
        assert!(dashboard
            .charts
            .iter()
            .flat_map(|c| &c.totals)
            .all(|t| t.total == 0.0));
    }

    #[test]
    fn test_unknown_value_warning() {
        let table = fixture();
        let selection = FilterSelection::default()
            .with(Dimension::Campaign, Selection::Value("winter".to_string()));
        let dashboard =
            build_dashboard(&table, &selection, &MetricsConfig::default(), "").unwrap();

        assert_eq!(
            dashboard.warnings[0],
            PipelineWarning::UnknownValue {
                dimension: Dimension::Campaign,
                value: "winter".to_string()
            }
        );
        assert!(dashboard.is_empty());
    }

    #[test]
    fn test_variant_mismatch_is_an_error() {
        let table = fixture();
        let metrics = MetricsConfig {
            variant: Variant::ThreeWay,
            ..MetricsConfig::default()
        };
        let err = build_dashboard(&table, &FilterSelection::default(), &metrics, "").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownMetric(c) if c == "ga4recalc_users"));
    }

    #[test]
    fn test_three_way_layout() {
        let metrics = MetricsConfig {
            variant: Variant::ThreeWay,
            ..MetricsConfig::default()
        };
        let content = "date,source,medium,campaign,\
            ua_users,ga4api_users,ga4recalc_users,\
            ua_sessions,ga4api_sessions,ga4recalc_sessions,\
            ua_transactions,ga4api_transactions,ga4recalc_transactions\n\
            2023-01-01,google,cpc,x,1,2,3,4,5,6,7,8,9\n\
            2023-01-02,bing,organic,y,1,2,3,4,5,6,7,8,9\n";
        let options = LoadOptions {
            required_metrics: metrics.required_columns(),
            ..LoadOptions::default()
        };
        let table = read_table(content.as_bytes(), Path::new("three_way.csv"), &options).unwrap();

        let selection = FilterSelection::default()
            .with(Dimension::Source, Selection::Value("google".to_string()));
        let dashboard = build_dashboard(&table, &selection, &metrics, "three_way.csv").unwrap();

        assert!(dashboard.warnings.is_empty());
        assert_eq!(dashboard.metadata.rows_matched, 1);
        assert_eq!(dashboard.charts.len(), 4);

        let users = &dashboard.charts[0];
        let series: Vec<&str> = users.data.rows.iter().map(|r| r.series.as_str()).collect();
        assert_eq!(series, vec!["ua_users", "ga4api_users", "ga4recalc_users"]);
        assert_eq!(total(users, "ua_users"), 1.0);
        assert_eq!(total(users, "ga4api_users"), 2.0);
        assert_eq!(total(users, "ga4recalc_users"), 3.0);
        assert_eq!(total(&dashboard.charts[1], "ga4recalc_sessions"), 6.0);
        assert_eq!(total(&dashboard.charts[2], "ua_transactions"), 7.0);

        let recalculated = &dashboard.charts[3];
        assert_eq!(recalculated.kind, ChartKind::Bar);
        let totals: Vec<f64> = recalculated.totals.iter().map(|t| t.total).collect();
        assert_eq!(totals, vec![3.0, 6.0, 9.0]);
    }
}
