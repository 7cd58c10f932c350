//! BigQuery backend over the REST v2 API.
//!
//! Loads go through a resumable upload: the job configuration is posted
//! first, the NDJSON body is then sent to the returned session URI, and the
//! job is polled until BigQuery reports it `DONE`.

use crate::warehouse::error::WarehouseError;
use crate::warehouse::{DatasetRef, LoadJobConfig, LoadOutcome, TableRef, Warehouse};
use async_trait::async_trait;
use bon::bon;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use log::{debug, info};
use polars::prelude::*;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";
pub const DEFAULT_API_ROOT: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_UPLOAD_ROOT: &str = "https://bigquery.googleapis.com/upload/bigquery/v2";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DATASET_TIMEOUT: Duration = Duration::from_secs(30);
const JOB_DONE: &str = "DONE";

/// Supplies OAuth bearer tokens for BigQuery requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, WarehouseError>;
}

/// Tokens from Google credentials: a service-account key or the ambient
/// provider.
struct GcpTokens(Arc<dyn TokenProvider>);

#[async_trait]
impl TokenSource for GcpTokens {
    async fn access_token(&self) -> Result<String, WarehouseError> {
        let token = self.0.token(&[BIGQUERY_SCOPE]).await?;
        Ok(token.as_str().to_string())
    }
}

/// A fixed token, for emulators and local stubs.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, WarehouseError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_reference: JobReference,
    status: Option<JobStatus>,
    statistics: Option<JobStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobStatistics {
    load: Option<LoadStatistics>,
}

// int64 values arrive as JSON strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadStatistics {
    output_rows: Option<String>,
}

impl Job {
    fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == JOB_DONE)
    }

    fn output_rows(&self) -> Option<usize> {
        self.statistics
            .as_ref()?
            .load
            .as_ref()?
            .output_rows
            .as_ref()?
            .parse()
            .ok()
    }
}

pub struct BigQueryWarehouse {
    http: Client,
    tokens: Arc<dyn TokenSource>,
    api_root: String,
    upload_root: String,
    poll_interval: Duration,
}

#[bon]
impl BigQueryWarehouse {
    /// Roots default to the public BigQuery endpoints and may be given with
    /// or without a trailing slash.
    #[builder]
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        #[builder(into)] api_root: Option<String>,
        #[builder(into)] upload_root: Option<String>,
        poll_interval: Option<Duration>,
        http: Option<Client>,
    ) -> Self {
        let trim = |root: String| root.trim_end_matches('/').to_string();
        Self {
            http: http.unwrap_or_default(),
            tokens,
            api_root: trim(api_root.unwrap_or_else(|| DEFAULT_API_ROOT.to_string())),
            upload_root: trim(upload_root.unwrap_or_else(|| DEFAULT_UPLOAD_ROOT.to_string())),
            poll_interval: poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
        }
    }

    /// Authenticates with a service-account key file when one is given,
    /// otherwise with whatever credentials the environment provides.
    pub async fn connect(credentials_path: Option<&Path>) -> Result<Self, WarehouseError> {
        let provider: Arc<dyn TokenProvider> = match credentials_path {
            Some(path) => {
                info!("Using service account credentials from {}", path.display());
                Arc::new(CustomServiceAccount::from_file(path)?)
            }
            None => gcp_auth::provider().await?,
        };
        Ok(Self::builder()
            .tokens(Arc::new(GcpTokens(provider)))
            .build())
    }

    async fn token(&self) -> Result<String, WarehouseError> {
        self.tokens.access_token().await
    }

    async fn start_upload(
        &self,
        table: &TableRef,
        config: &LoadJobConfig,
        token: &str,
    ) -> Result<String, WarehouseError> {
        let url = format!(
            "{}/projects/{}/jobs?uploadType=resumable",
            self.upload_root, table.dataset.project_id
        );

        let mut load = serde_json::to_value(config)?;
        load["destinationTable"] = json!({
            "projectId": table.dataset.project_id,
            "datasetId": table.dataset.dataset_id,
            "tableId": table.table_id,
        });
        let body = json!({ "configuration": { "load": load } });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&url, e))?;
        let response = check_status(response, &url).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| WarehouseError::MissingUploadSession(table.to_string()))
    }

    async fn get_job(
        &self,
        project_id: &str,
        reference: &JobReference,
        token: &str,
    ) -> Result<Job, WarehouseError> {
        let url = format!(
            "{}/projects/{project_id}/jobs/{}",
            self.api_root, reference.job_id
        );
        let mut request = self.http.get(&url).bearer_auth(token);
        if let Some(location) = &reference.location {
            request = request.query(&[("location", location)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&url, e))?;
        check_status(response, &url)
            .await?
            .json::<Job>()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&url, e))
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn create_dataset(
        &self,
        dataset: &DatasetRef,
        location: &str,
    ) -> Result<(), WarehouseError> {
        let url = format!("{}/projects/{}/datasets", self.api_root, dataset.project_id);
        let body = json!({
            "datasetReference": {
                "projectId": dataset.project_id,
                "datasetId": dataset.dataset_id,
            },
            "location": location,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token().await?)
            .timeout(DATASET_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&url, e))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(WarehouseError::AlreadyExists(dataset.to_string()));
        }
        check_status(response, &url).await?;
        Ok(())
    }

    async fn load_table(
        &self,
        frame: &DataFrame,
        table: &TableRef,
        config: &LoadJobConfig,
    ) -> Result<LoadOutcome, WarehouseError> {
        let mut frame = frame.clone();
        let mut ndjson = Vec::new();
        JsonWriter::new(&mut ndjson)
            .with_json_format(JsonFormat::JsonLines)
            .finish(&mut frame)
            .map_err(|e| WarehouseError::Serialize(table.to_string(), e))?;

        let token = self.token().await?;
        let session = self.start_upload(table, config, &token).await?;
        debug!("Uploading {} bytes to {}", ndjson.len(), table);

        let response = self
            .http
            .put(&session)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(ndjson)
            .send()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&session, e))?;
        let mut job = check_status(response, &session)
            .await?
            .json::<Job>()
            .await
            .map_err(|e| WarehouseError::from_reqwest(&session, e))?;

        info!("Started load job {} for {}", job.job_reference.job_id, table);

        while !job.is_done() {
            tokio::time::sleep(self.poll_interval).await;
            let token = self.token().await?;
            job = self
                .get_job(&table.dataset.project_id, &job.job_reference, &token)
                .await?;
        }

        if let Some(error) = job.status.as_ref().and_then(|s| s.error_result.as_ref()) {
            return Err(WarehouseError::LoadJobFailed {
                job_id: job.job_reference.job_id.clone(),
                reason: error.reason.clone().unwrap_or_default(),
                message: error.message.clone().unwrap_or_default(),
            });
        }

        Ok(LoadOutcome {
            rows_loaded: job.output_rows().unwrap_or(frame.height()),
            job_id: Some(job.job_reference.job_id),
        })
    }
}

async fn check_status(response: Response, url: &str) -> Result<Response, WarehouseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(WarehouseError::Api {
        url: url.to_string(),
        status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_default_and_lose_trailing_slash() {
        let warehouse = BigQueryWarehouse::builder()
            .tokens(Arc::new(StaticToken::new("token")))
            .api_root("http://localhost:9050/bigquery/v2/")
            .build();
        assert_eq!(warehouse.api_root, "http://localhost:9050/bigquery/v2");
        assert_eq!(warehouse.upload_root, DEFAULT_UPLOAD_ROOT);
        assert_eq!(warehouse.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_job_parsing_running() {
        let job: Job = serde_json::from_value(json!({
            "jobReference": {"projectId": "p", "jobId": "job_1", "location": "europe-west8"},
            "status": {"state": "RUNNING"}
        }))
        .unwrap();
        assert!(!job.is_done());
        assert_eq!(job.job_reference.location.as_deref(), Some("europe-west8"));
        assert_eq!(job.output_rows(), None);
    }

    #[test]
    fn test_job_parsing_done_with_rows() {
        let job: Job = serde_json::from_value(json!({
            "jobReference": {"projectId": "p", "jobId": "job_2"},
            "status": {"state": "DONE"},
            "statistics": {"load": {"outputRows": "40"}}
        }))
        .unwrap();
        assert!(job.is_done());
        assert_eq!(job.output_rows(), Some(40));
    }

    #[test]
    fn test_job_parsing_error_result() {
        let job: Job = serde_json::from_value(json!({
            "jobReference": {"jobId": "job_3"},
            "status": {
                "state": "DONE",
                "errorResult": {"reason": "invalid", "message": "Provided Schema does not match"}
            }
        }))
        .unwrap();
        let error = job.status.unwrap().error_result.unwrap();
        assert_eq!(error.reason.as_deref(), Some("invalid"));
    }
}
