//! Provider response shapes.
//!
//! Responses are kept as loosely typed JSON objects (the provider decides
//! which fields exist) but the handful of fields the transformers rely on are
//! checked while decoding, so a malformed payload fails at the fetch step with
//! a message naming the problem.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// The two provider endpoints queried for every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Current conditions for one location, as returned by the `weather` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CurrentWeather(Map<String, Value>);

impl CurrentWeather {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Map<String, Value>> for CurrentWeather {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get("dt") {
            None => {}
            Some(dt) if dt.is_i64() => {}
            Some(other) => {
                return Err(format!(
                    "field `dt` must be an integer epoch timestamp, found {other}"
                ))
            }
        }
        Ok(Self(fields))
    }
}

/// The 5 day / 3 hour forecast for one location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastResponse {
    pub city: Map<String, Value>,
    pub list: Vec<ForecastInterval>,
}

/// One 3-hour slot of a forecast.
///
/// `weather` is guaranteed to be a non-empty array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ForecastInterval(Map<String, Value>);

impl ForecastInterval {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Map<String, Value>> for ForecastInterval {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get("weather") {
            Some(Value::Array(conditions)) if !conditions.is_empty() => Ok(Self(fields)),
            Some(Value::Array(_)) => Err("forecast interval has an empty `weather` list".into()),
            Some(other) => Err(format!(
                "forecast interval `weather` must be a list, found {other}"
            )),
            None => Err("forecast interval is missing `weather`".into()),
        }
    }
}
