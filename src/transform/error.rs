use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to encode flattened rows")]
    Encode(#[from] serde_json::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to transform {kind} weather for '{location}'")]
    Location {
        kind: &'static str,
        location: String,
        #[source]
        source: Box<TransformError>,
    },
}

impl TransformError {
    pub(crate) fn for_location(self, kind: &'static str, location: &str) -> Self {
        TransformError::Location {
            kind,
            location: location.to_string(),
            source: Box::new(self),
        }
    }
}
