use crate::locations::{Location, LocationRegistry};
use crate::utils::error_chain;
use crate::weather::error::FetchError;
use crate::weather::types::{CurrentWeather, ForecastResponse};
use async_trait::async_trait;
use log::{error, info};

/// A provider of current and forecast weather for a single location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, location: &Location) -> Result<CurrentWeather, FetchError>;

    async fn forecast(&self, location: &Location) -> Result<ForecastResponse, FetchError>;
}

/// Everything fetched in one run, in registry order.
///
/// A location appears in both `current` and `forecast` or in neither.
#[derive(Debug, Clone, Default)]
pub struct WeatherData {
    pub current: Vec<(String, CurrentWeather)>,
    pub forecast: Vec<(String, ForecastResponse)>,
    pub failed: Vec<String>,
}

impl WeatherData {
    pub fn current_for(&self, name: &str) -> Option<&CurrentWeather> {
        self.current.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn forecast_for(&self, name: &str) -> Option<&ForecastResponse> {
        self.forecast.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn succeeded(&self) -> usize {
        self.current.len()
    }
}

pub struct WeatherFetcher<S> {
    source: S,
}

impl<S: WeatherSource> WeatherFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches both endpoints for every location, one location at a time.
    ///
    /// A failure on either endpoint drops the location from the result and
    /// is logged; the remaining locations are still fetched.
    pub async fn fetch_all(&self, locations: &LocationRegistry) -> WeatherData {
        let mut data = WeatherData::default();

        for location in locations {
            match self.fetch_location(location).await {
                Ok((current, forecast)) => {
                    data.current.push((location.name.clone(), current));
                    data.forecast.push((location.name.clone(), forecast));
                }
                Err(e) => {
                    error!(
                        "Error fetching data for location {}: {}",
                        location.name,
                        error_chain(&e)
                    );
                    data.failed.push(location.name.clone());
                }
            }
        }

        info!(
            "Weather data fetched for {} of {} locations",
            data.succeeded(),
            locations.len()
        );
        data
    }

    async fn fetch_location(
        &self,
        location: &Location,
    ) -> Result<(CurrentWeather, ForecastResponse), FetchError> {
        let current = self.source.current(location).await?;
        let forecast = self.source.forecast(location).await?;
        Ok((current, forecast))
    }
}
