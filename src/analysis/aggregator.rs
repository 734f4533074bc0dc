//! Group-by-date aggregation of metric columns.

use crate::error::PipelineError;
use crate::models::{AggregatedSeries, Table};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sum each of `metric_columns` per date.
///
/// Dates with no rows are absent from the result. Empty or non-numeric
/// cells contribute nothing to the sum. Asking for a column the table does
/// not have is an error rather than a silent series of zeros.
pub fn aggregate(
    table: &Table,
    metric_columns: &[String],
) -> Result<AggregatedSeries, PipelineError> {
    let indices = metric_columns
        .iter()
        .map(|column| {
            table
                .metric_index(column)
                .ok_or_else(|| PipelineError::UnknownMetric(column.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut values: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for row in table.rows() {
        let sums = values
            .entry(row.date)
            .or_insert_with(|| vec![0.0; indices.len()]);

        for (slot, &idx) in sums.iter_mut().zip(&indices) {
            if let Some(Some(value)) = row.metrics.get(idx) {
                *slot += value;
            }
        }
    }

    Ok(AggregatedSeries::new(metric_columns.to_vec(), values))
}
