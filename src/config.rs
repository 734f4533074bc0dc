//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ga4compare.toml` files, including the metric column layout of the
//! comparison table.

use crate::cli::{Args, OutputFormat};
use crate::models::{Dimension, FilterSelection, Selection};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".ga4compare.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input table settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Default filter selection.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Metric column layout.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path. Stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Comparison table location and dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: String,

    /// Single ASCII field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> String {
    "/data/in/tables/COMPARISON.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Filter defaults. Dimension values left unset mean "All ...".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            source: None,
            medium: None,
            campaign: None,
        }
    }
}

fn default_start_date() -> NaiveDate {
    FilterSelection::default().start_date
}

fn default_end_date() -> NaiveDate {
    FilterSelection::default().end_date
}

impl FiltersConfig {
    /// Build the filter selection for one render pass.
    pub fn to_selection(&self) -> FilterSelection {
        let pick = |dimension: Dimension, value: &Option<String>| {
            value
                .as_deref()
                .map(|v| Selection::from_input(dimension, v))
                .unwrap_or_default()
        };

        FilterSelection::between(self.start_date, self.end_date)
            .with(Dimension::Source, pick(Dimension::Source, &self.source))
            .with(Dimension::Medium, pick(Dimension::Medium, &self.medium))
            .with(Dimension::Campaign, pick(Dimension::Campaign, &self.campaign))
    }
}

/// Known layouts of the comparison table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// UA, GA4 API, GA4 export and recalculated GA4 columns.
    #[default]
    FourWay,
    /// UA, GA4 API and recalculated GA4 columns.
    ThreeWay,
}

impl Variant {
    /// Column prefixes of the compared pipelines, in chart order.
    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Variant::FourWay => &["ua", "ga4api", "ga4export", "ga4_ua"],
            Variant::ThreeWay => &["ua", "ga4api", "ga4recalc"],
        }
    }

    /// Prefix of the GA4 columns recalculated with UA methodology.
    pub fn recalculated_prefix(&self) -> &'static str {
        match self {
            Variant::FourWay => "ga4_ua",
            Variant::ThreeWay => "ga4recalc",
        }
    }

    /// The per-metric families charted as lines.
    pub fn families(&self) -> Vec<MetricFamily> {
        METRICS
            .iter()
            .map(|(metric, title)| MetricFamily {
                title: title.to_string(),
                columns: self
                    .prefixes()
                    .iter()
                    .map(|prefix| format!("{}_{}", prefix, metric))
                    .collect(),
            })
            .collect()
    }

    /// The recalculated-methodology family charted as bars.
    pub fn recalculated(&self) -> MetricFamily {
        MetricFamily {
            title: RECALCULATED_TITLE.to_string(),
            columns: METRICS
                .iter()
                .map(|(metric, _)| format!("{}_{}", self.recalculated_prefix(), metric))
                .collect(),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::FourWay => write!(f, "four-way"),
            Variant::ThreeWay => write!(f, "three-way"),
        }
    }
}

const METRICS: [(&str, &str); 3] = [
    ("users", "Users"),
    ("sessions", "Sessions"),
    ("transactions", "Transactions"),
];

const RECALCULATED_TITLE: &str = "GA4 metrics recalculated to GA UA methodology";

/// A chart's worth of metric columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub title: String,
    pub columns: Vec<String>,
}

/// Metric column layout: a preset, optionally overridden per family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub variant: Variant,

    /// Replaces the preset's line-chart families when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families: Option<Vec<MetricFamily>>,

    /// Replaces the preset's recalculated family when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recalculated: Option<MetricFamily>,
}

impl MetricsConfig {
    pub fn effective_families(&self) -> Vec<MetricFamily> {
        self.families
            .clone()
            .unwrap_or_else(|| self.variant.families())
    }

    pub fn effective_recalculated(&self) -> MetricFamily {
        self.recalculated
            .clone()
            .unwrap_or_else(|| self.variant.recalculated())
    }

    /// Every metric column the configuration references, first-seen order.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let families = self.effective_families();
        let recalculated = self.effective_recalculated();

        for column in families
            .iter()
            .chain(std::iter::once(&recalculated))
            .flat_map(|f| &f.columns)
        {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        columns
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only flags given explicitly on the command line override file values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter;
        }

        if let Some(start_date) = args.start_date {
            self.filters.start_date = start_date;
        }
        if let Some(end_date) = args.end_date {
            self.filters.end_date = end_date;
        }
        if let Some(ref source) = args.source {
            self.filters.source = Some(source.clone());
        }
        if let Some(ref medium) = args.medium {
            self.filters.medium = Some(medium.clone());
        }
        if let Some(ref campaign) = args.campaign {
            self.filters.campaign = Some(campaign.clone());
        }

        if let Some(variant) = args.variant {
            self.metrics.variant = variant;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if !self.data.delimiter.is_ascii() {
            bail!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            );
        }

        let families = self.metrics.effective_families();
        if families.is_empty() {
            bail!("At least one metric family must be configured");
        }
        for family in families
            .iter()
            .chain(std::iter::once(&self.metrics.effective_recalculated()))
        {
            if family.columns.is_empty() {
                bail!("Metric family '{}' has no columns", family.title);
            }
        }

        Ok(())
    }

    /// The delimiter as a byte for the CSV reader.
    pub fn delimiter_byte(&self) -> u8 {
        self.data.delimiter as u8
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
