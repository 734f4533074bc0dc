//! Filter options and row filtering.

use crate::models::{Dimension, FilterSelection, Table};
use std::collections::HashSet;
use tracing::debug;

/// Selectable values for a dimension: the sentinel first, then every
/// distinct value in first-seen order.
///
/// Always computed from the unfiltered table so the offered options do not
/// shrink as filters are applied.
pub fn distinct_values(table: &Table, dimension: Dimension) -> Vec<String> {
    let mut values = vec![dimension.sentinel()];
    let mut seen: HashSet<&str> = HashSet::new();

    for row in table.rows() {
        let value = row.dimension(dimension);
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }

    values
}

/// Keep the rows matching every active constraint of `selection`.
///
/// Returns a new table; row order is preserved. An inverted date range or a
/// value that never occurs simply yields an empty table.
pub fn filter(table: &Table, selection: &FilterSelection) -> Table {
    let rows = table
        .rows()
        .iter()
        .filter(|row| selection.contains_date(row.date))
        .filter(|row| {
            Dimension::ALL
                .iter()
                .all(|dim| selection.get(*dim).matches(row.dimension(*dim)))
        })
        .cloned()
        .collect();

    let filtered = table.with_rows(rows);
    debug!(
        "Filter [{}] kept {} of {} rows",
        selection,
        filtered.len(),
        table.len()
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Row, Selection};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn row(day: u32, source: &str, medium: &str, campaign: &str) -> Row {
        Row {
            date: date(day),
            source: source.to_string(),
            medium: medium.to_string(),
            campaign: campaign.to_string(),
            metrics: vec![Some(1.0)],
        }
    }

    fn sample_table() -> Table {
        Table::new(
            vec!["ua_users".to_string()],
            vec![
                row(1, "google", "cpc", "x"),
                row(1, "bing", "organic", "y"),
                row(2, "google", "organic", "y"),
                row(3, "google", "cpc", "x"),
                row(4, "newsletter", "email", "z"),
            ],
        )
    }

    fn whole_month() -> FilterSelection {
        FilterSelection::between(date(1), date(31))
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let table = Table::new(
            vec![],
            vec![row(1, "google", "a", "a"), row(1, "bing", "a", "a"), row(2, "google", "a", "a")],
        );
        assert_eq!(
            distinct_values(&table, Dimension::Source),
            vec!["All sources", "google", "bing"]
        );
    }

    #[test]
    fn test_distinct_values_empty_table() {
        assert_eq!(
            distinct_values(&Table::default(), Dimension::Campaign),
            vec!["All campaigns"]
        );
    }

    #[test]
    fn test_filter_all_sentinels_keeps_everything() {
        let table = sample_table();
        let filtered = filter(&table, &whole_month());
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_filter_by_source() {
        let table = sample_table();
        let selection = whole_month().with(Dimension::Source, Selection::Value("google".into()));
        let filtered = filter(&table, &selection);

        assert_eq!(filtered.len(), 3);
        assert!(filtered.rows().iter().all(|r| r.source == "google"));
        assert_eq!(filtered.metric_columns(), table.metric_columns());
    }

    #[test]
    fn test_filter_combines_constraints() {
        let table = sample_table();
        let selection = whole_month()
            .with(Dimension::Source, Selection::Value("google".into()))
            .with(Dimension::Medium, Selection::Value("cpc".into()))
            .with(Dimension::Campaign, Selection::Value("x".into()));
        let filtered = filter(&table, &selection);

        let dates: Vec<NaiveDate> = filtered.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1), date(3)]);
    }

    #[test]
    fn test_filter_is_monotonic() {
        let table = sample_table();
        let mut selection = whole_month();
        let mut previous = filter(&table, &selection).len();

        for (dim, value) in [
            (Dimension::Source, "google"),
            (Dimension::Medium, "organic"),
            (Dimension::Campaign, "y"),
        ] {
            selection = selection.with(dim, Selection::Value(value.to_string()));
            let filtered = filter(&table, &selection);
            assert!(filtered.len() <= previous);
            assert!(filtered.rows().iter().all(|r| table.rows().contains(r)));
            previous = filtered.len();
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn test_filter_single_day() {
        let table = sample_table();
        let filtered = filter(&table, &FilterSelection::between(date(1), date(1)));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.rows().iter().all(|r| r.date == date(1)));
    }

    #[test]
    fn test_filter_inverted_range_is_empty() {
        let table = sample_table();
        let filtered = filter(&table, &FilterSelection::between(date(4), date(1)));
        assert!(filtered.is_empty());
        assert_eq!(filtered.metric_columns(), table.metric_columns());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let table = sample_table();
        let selection = whole_month().with(Dimension::Medium, Selection::Value("organic".into()));
        assert_eq!(filter(&table, &selection), filter(&table, &selection));
        // Filtering the filtered table again changes nothing
        let once = filter(&table, &selection);
        assert_eq!(filter(&once, &selection), once);
    }

    #[test]
    fn test_filter_unknown_value() {
        let table = sample_table();
        let selection = whole_month().with(Dimension::Source, Selection::Value("yahoo".into()));
        assert!(filter(&table, &selection).is_empty());
    }

    #[test]
    fn test_filter_selects_empty_value() {
        let table = Table::new(
            vec!["ua_users".to_string()],
            vec![row(1, "", "cpc", "x"), row(2, "g", "cpc", "x")],
        );
        let options = distinct_values(&table, Dimension::Source);
        assert_eq!(options, vec!["All sources", "", "g"]);

        // Every offered option other than the sentinel narrows the result
        let selection =
            whole_month().with(Dimension::Source, Selection::from_input(Dimension::Source, &options[1]));
        let filtered = filter(&table, &selection);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].source, "");
        assert_eq!(filtered.rows()[0].date, date(1));
    }
}
