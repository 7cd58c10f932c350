pub mod current;
pub mod error;
pub mod flatten;
pub mod forecast;
pub mod frame;

use crate::transform::current::transform_current;
use crate::transform::error::TransformError;
use crate::transform::forecast::transform_forecast;
use crate::transform::frame::concat_frames;
use crate::weather::fetcher::WeatherData;
use polars::prelude::DataFrame;

/// The two tables produced by one run.
#[derive(Debug, Clone)]
pub struct WeatherTables {
    /// One row per location.
    pub current: DataFrame,
    /// One row per location and forecast interval.
    pub forecast: DataFrame,
}

/// Transforms every fetched record and stacks the results per table.
pub fn build_tables(data: &WeatherData) -> Result<WeatherTables, TransformError> {
    let current = data
        .current
        .iter()
        .map(|(name, record)| {
            transform_current(record).map_err(|e| e.for_location("current", name))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let forecast = data
        .forecast
        .iter()
        .map(|(name, record)| {
            transform_forecast(record).map_err(|e| e.for_location("forecast", name))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeatherTables {
        current: concat_frames(current)?,
        forecast: concat_frames(forecast)?,
    })
}
