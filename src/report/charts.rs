//! Vega-Lite chart specifications.
//!
//! Each chart becomes a standalone Vega-Lite v5 spec with inline data in
//! long format, so any Vega-Lite renderer can draw it.

use crate::dashboard::{Chart, Dashboard, SERIES_NAME};
use anyhow::Result;
use serde_json::{json, Value};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;

/// Build the spec for a single chart.
pub fn chart_spec(chart: &Chart) -> Value {
    let value_name = chart.data.value_name.as_str();

    let values: Vec<Value> = chart
        .data
        .rows
        .iter()
        .map(|row| {
            json!({
                "date": row.date.to_string(),
                SERIES_NAME: row.series,
                value_name: row.value,
            })
        })
        .collect();

    json!({
        "$schema": SCHEMA,
        "title": chart.title,
        "width": WIDTH,
        "height": HEIGHT,
        "data": { "values": values },
        "mark": { "type": chart.kind.mark() },
        "encoding": {
            "x": { "field": "date", "type": "temporal" },
            "y": {
                "field": value_name,
                "type": "quantitative",
                "axis": { "title": chart.y_title },
            },
            "color": { "field": SERIES_NAME, "type": "nominal" },
            "tooltip": [
                { "field": "date", "type": "temporal" },
                { "field": value_name, "type": "quantitative" },
            ],
        },
    })
}

/// Generate a JSON array holding one spec per chart.
pub fn generate_vega_lite_report(dashboard: &Dashboard) -> Result<String> {
    let specs: Vec<Value> = dashboard.charts.iter().map(chart_spec).collect();
    serde_json::to_string_pretty(&specs).map_err(Into::into)
}
