//! Wide-to-long reshaping for chart renderers.

use crate::models::{AggregatedSeries, LongRow, LongTable};

/// Turn a per-date aggregate into `(date, series, value)` rows.
///
/// Rows are ordered by date ascending, then by the aggregate's column order.
pub fn reshape_long(aggregated: &AggregatedSeries, value_name: &str) -> LongTable {
    let rows = aggregated
        .iter()
        .flat_map(|(date, sums)| {
            aggregated
                .columns()
                .iter()
                .zip(sums)
                .map(move |(series, value)| LongRow {
                    date: *date,
                    series: series.clone(),
                    value: *value,
                })
        })
        .collect();

    LongTable {
        value_name: value_name.to_string(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, filter};
    use crate::models::{Dimension, FilterSelection, Row, Selection, Table};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn columns() -> Vec<String> {
        vec!["ua_users".to_string(), "ga4api_users".to_string()]
    }

    fn scenario_table() -> Table {
        Table::new(
            columns(),
            vec![
                Row {
                    date: date(1),
                    source: "google".to_string(),
                    medium: "cpc".to_string(),
                    campaign: "x".to_string(),
                    metrics: vec![Some(10.0), Some(12.0)],
                },
                Row {
                    date: date(2),
                    source: "bing".to_string(),
                    medium: "organic".to_string(),
                    campaign: "y".to_string(),
                    metrics: vec![Some(5.0), Some(4.0)],
                },
            ],
        )
    }

    #[test]
    fn test_google_scenario_end_to_end() {
        let table = scenario_table();
        let selection = FilterSelection::between(date(1), date(31))
            .with(Dimension::Source, Selection::Value("google".to_string()));

        let filtered = filter(&table, &selection);
        assert_eq!(filtered.len(), 1);

        let aggregated = aggregate(&filtered, &columns()).unwrap();
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated.get(date(1), "ua_users"), Some(10.0));
        assert_eq!(aggregated.get(date(1), "ga4api_users"), Some(12.0));

        let long = reshape_long(&aggregated, "value");
        assert_eq!(
            long.rows,
            vec![
                LongRow {
                    date: date(1),
                    series: "ua_users".to_string(),
                    value: 10.0
                },
                LongRow {
                    date: date(1),
                    series: "ga4api_users".to_string(),
                    value: 12.0
                },
            ]
        );
    }

    #[test]
    fn test_reshape_orders_by_date_then_column() {
        let aggregated = aggregate(&scenario_table(), &columns()).unwrap();
        let long = reshape_long(&aggregated, "value");

        let order: Vec<(NaiveDate, &str)> = long
            .rows
            .iter()
            .map(|r| (r.date, r.series.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (date(1), "ua_users"),
                (date(1), "ga4api_users"),
                (date(2), "ua_users"),
                (date(2), "ga4api_users"),
            ]
        );
    }

    #[test]
    fn test_reshape_preserves_total() {
        let table = scenario_table();
        let aggregated = aggregate(&table, &columns()).unwrap();
        let long = reshape_long(&aggregated, "value");

        let expected: f64 = columns()
            .iter()
            .filter_map(|c| table.metric_total(c))
            .sum();
        assert_eq!(long.total(), expected);
    }

    #[test]
    fn test_zero_match_scenario_is_empty_not_error() {
        let table = scenario_table();
        let selection = FilterSelection::between(date(10), date(20));

        let filtered = filter(&table, &selection);
        let aggregated = aggregate(&filtered, &columns()).unwrap();
        let long = reshape_long(&aggregated, "value");

        assert!(aggregated.is_empty());
        assert!(long.is_empty());
        assert_eq!(long.value_name, "value");
    }
}
