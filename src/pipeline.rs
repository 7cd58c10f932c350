use crate::config::{EtlConfig, TableNames};
use crate::error::EtlError;
use crate::locations::LocationRegistry;
use crate::transform::build_tables;
use crate::trigger::InboundPayload;
use crate::warehouse::bigquery::BigQueryWarehouse;
use crate::warehouse::writer::{TableWriter, WriteOutcome};
use crate::warehouse::Warehouse;
use crate::weather::client::OpenWeatherClient;
use crate::weather::fetcher::{WeatherFetcher, WeatherSource};
use bon::bon;
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Returned to the caller of [`WeatherPipeline::handle`] on success.
pub const SUCCESS_STATUS: &str = "200, Success";

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub locations_fetched: usize,
    pub locations_failed: Vec<String>,
    pub current: WriteOutcome,
    pub forecast: WriteOutcome,
}

/// Fetch → transform → write, for every configured location.
pub struct WeatherPipeline<S, W> {
    fetcher: WeatherFetcher<S>,
    writer: TableWriter<W>,
    locations: LocationRegistry,
    tables: TableNames,
}

#[bon]
impl<S: WeatherSource, W: Warehouse> WeatherPipeline<S, W> {
    #[builder]
    pub fn new(
        source: S,
        writer: TableWriter<W>,
        locations: Option<LocationRegistry>,
        tables: Option<TableNames>,
    ) -> Self {
        Self {
            fetcher: WeatherFetcher::new(source),
            writer,
            locations: locations.unwrap_or_default(),
            tables: tables.unwrap_or_default(),
        }
    }

    /// Runs the whole pipeline once.
    ///
    /// Fetch failures only drop the affected locations. A failed write ends
    /// the run; if the current table fails, the forecast table is not
    /// written.
    pub async fn run(&self) -> Result<RunSummary, EtlError> {
        let started_at = Utc::now();
        info!("Starting run for {} locations", self.locations.len());

        let data = self.fetcher.fetch_all(&self.locations).await;
        let tables = build_tables(&data)?;
        debug!(
            "Built tables: {} current rows, {} forecast rows",
            tables.current.height(),
            tables.forecast.height()
        );

        let current = self.write(&tables.current, &self.tables.current).await?;
        let forecast = self.write(&tables.forecast, &self.tables.forecast).await?;

        let summary = RunSummary {
            started_at,
            locations_fetched: data.succeeded(),
            locations_failed: data.failed,
            current,
            forecast,
        };
        info!("Run finished: {:?}", summary);
        Ok(summary)
    }

    /// Entry point for an inbound trigger. The body is decoded before any
    /// fetching starts, but its contents do not affect the run.
    pub async fn handle(&self, payload: InboundPayload) -> Result<&'static str, EtlError> {
        let body = payload.into_body()?;
        debug!("Triggered with body {}", body);
        self.run().await?;
        Ok(SUCCESS_STATUS)
    }

    async fn write(
        &self,
        frame: &polars::prelude::DataFrame,
        table: &str,
    ) -> Result<WriteOutcome, EtlError> {
        self.writer
            .write(frame, table)
            .await
            .map_err(|source| EtlError::TableWrite {
                table: table.to_string(),
                source,
            })
    }
}

impl<W: Warehouse> WeatherPipeline<OpenWeatherClient, W> {
    /// Wires the OpenWeather client and the given warehouse from `config`.
    pub fn from_config(config: &EtlConfig, warehouse: W) -> Self {
        let source = OpenWeatherClient::builder()
            .api_key(config.api_key.clone())
            .base_url(config.provider_base_url.clone())
            .build();
        let writer = TableWriter::builder()
            .warehouse(warehouse)
            .project_id(config.project_id.clone())
            .dataset_id(config.dataset_id.clone())
            .dataset_location(config.dataset_location.clone())
            .build();
        Self::builder()
            .source(source)
            .writer(writer)
            .locations(config.locations.clone())
            .tables(config.tables.clone())
            .build()
    }
}

impl WeatherPipeline<OpenWeatherClient, BigQueryWarehouse> {
    /// The production pipeline: OpenWeather into BigQuery.
    pub async fn bigquery(config: &EtlConfig) -> Result<Self, EtlError> {
        let warehouse = BigQueryWarehouse::connect(config.credentials_path.as_deref()).await?;
        Ok(Self::from_config(config, warehouse))
    }
}
