use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Dataset '{0}' already exists")]
    AlreadyExists(String),

    #[error("Dataset '{0}' does not exist")]
    DatasetNotFound(String),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Table '{0}' already contains data")]
    TableNotEmpty(String),

    #[error("Failed to obtain a warehouse access token")]
    Auth(#[from] gcp_auth::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Could not decode the response from {0}")]
    Decode(String, #[source] reqwest::Error),

    #[error("Warehouse returned status {status} for {url}: {message}")]
    Api {
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Upload for table '{0}' did not return a session URI")]
    MissingUploadSession(String),

    #[error("Load job '{job_id}' failed ({reason}): {message}")]
    LoadJobFailed {
        job_id: String,
        reason: String,
        message: String,
    },

    #[error("Failed to serialise frame for table '{0}'")]
    Serialize(String, #[source] PolarsError),

    #[error("Failed to encode load job configuration")]
    EncodeConfig(#[from] serde_json::Error),

    #[error("No rows to load into table '{0}'")]
    NothingToLoad(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}

impl WarehouseError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_decode() {
            WarehouseError::Decode(url.to_string(), e)
        } else {
            WarehouseError::NetworkRequest(url.to_string(), e)
        }
    }
}
