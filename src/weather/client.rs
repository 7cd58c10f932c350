use crate::config::DEFAULT_PROVIDER_BASE_URL;
use crate::locations::Location;
use crate::weather::error::FetchError;
use crate::weather::fetcher::WeatherSource;
use crate::weather::types::{CurrentWeather, Endpoint, ForecastResponse};
use async_trait::async_trait;
use bon::bon;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;

const UNITS: &str = "metric";

/// HTTP client for the OpenWeather 2.5 REST API.
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[bon]
impl OpenWeatherClient {
    /// Creates a client. `base_url` defaults to the public API root and may
    /// be given with or without a trailing slash.
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into)] base_url: Option<String>,
        http: Option<Client>,
    ) -> Self {
        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: http.unwrap_or_default(),
            base_url,
            api_key,
        }
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path_segment())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        location: &Location,
    ) -> Result<T, FetchError> {
        let url = self.endpoint_url(endpoint);
        debug!("Requesting {} for {}", url, location.name);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", UNITS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, &location.name, e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    "HTTP error from {} endpoint for {}: {:?}",
                    endpoint,
                    location.name,
                    e.status()
                );
                return Err(FetchError::from_reqwest(endpoint, &location.name, e));
            }
        };

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, &location.name, e))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, location: &Location) -> Result<CurrentWeather, FetchError> {
        self.get_json(Endpoint::Current, location).await
    }

    async fn forecast(&self, location: &Location) -> Result<ForecastResponse, FetchError> {
        self.get_json(Endpoint::Forecast, location).await
    }
}
