use crate::weather::types::Endpoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request to {endpoint} endpoint failed for '{location}'")]
    NetworkRequest {
        endpoint: Endpoint,
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} endpoint returned status {status} for '{location}'")]
    HttpStatus {
        endpoint: Endpoint,
        location: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers both malformed JSON and JSON that fails structural validation
    #[error("Could not decode {endpoint} response for '{location}'")]
    Decode {
        endpoint: Endpoint,
        location: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub(crate) fn from_reqwest(endpoint: Endpoint, location: &str, e: reqwest::Error) -> Self {
        let location = location.to_string();
        if e.is_decode() {
            FetchError::Decode {
                endpoint,
                location,
                source: e.without_url(),
            }
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus {
                endpoint,
                location,
                status,
                source: e.without_url(),
            }
        } else {
            FetchError::NetworkRequest {
                endpoint,
                location,
                source: e.without_url(),
            }
        }
    }
}
