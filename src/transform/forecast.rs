use crate::transform::error::TransformError;
use crate::transform::flatten::{flatten_record, Row};
use crate::transform::frame::rows_to_frame;
use crate::weather::types::{ForecastInterval, ForecastResponse};
use polars::prelude::*;
use serde_json::Value;

/// Turns a forecast into one row per interval with the city columns
/// repeated on every row.
pub fn transform_forecast(forecast: &ForecastResponse) -> Result<DataFrame, TransformError> {
    let city = rows_to_frame(&[flatten_record(&forecast.city)])?;

    let rows: Vec<Row> = forecast.list.iter().map(flatten_interval).collect();
    let intervals = rows_to_frame(&rows)?;

    if intervals.height() == 0 || city.width() == 0 {
        return Ok(intervals);
    }

    let frame = intervals.lazy().cross_join(city.lazy(), None).collect()?;
    Ok(frame)
}

/// Keeps only the first weather condition of an interval, then flattens it.
fn flatten_interval(interval: &ForecastInterval) -> Row {
    let mut fields = interval.fields().clone();
    let primary = match fields.get("weather") {
        Some(Value::Array(conditions)) => conditions.first().cloned(),
        _ => None,
    };
    if let Some(primary) = primary {
        fields.insert("weather".to_string(), primary);
    }
    flatten_record(&fields)
}
