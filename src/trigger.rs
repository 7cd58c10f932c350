//! What starts a run: the inbound request payload, and a helper that POSTs
//! to a deployed instance to start one remotely.

use log::info;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Request body is not valid JSON")]
    MalformedBody(#[source] serde_json::Error),

    #[error("Request body is not valid UTF-8")]
    NotUtf8(#[source] std::string::FromUtf8Error),

    #[error("Request to {0} failed")]
    Request(String, #[source] reqwest::Error),

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
}

/// The body a run was started with.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    /// Already decoded by the transport.
    Structured(Value),
    /// JSON text still to be decoded.
    Raw(String),
}

impl InboundPayload {
    /// Picks the variant from the request's content type. JSON bodies are
    /// decoded right away; anything else is kept as raw text.
    pub fn from_http(content_type: Option<&str>, body: &[u8]) -> Result<Self, TriggerError> {
        let is_json = content_type
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| {
                let mime = mime.trim();
                mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
            });

        if is_json {
            let value = serde_json::from_slice(body).map_err(TriggerError::MalformedBody)?;
            Ok(Self::Structured(value))
        } else {
            let text = String::from_utf8(body.to_vec()).map_err(TriggerError::NotUtf8)?;
            Ok(Self::Raw(text))
        }
    }

    pub fn into_body(self) -> Result<Value, TriggerError> {
        match self {
            Self::Structured(value) => Ok(value),
            Self::Raw(text) => serde_json::from_str(&text).map_err(TriggerError::MalformedBody),
        }
    }
}

/// POSTs `body` to a deployed instance and returns its response text.
pub async fn invoke_remote(url: &str, body: &Value) -> Result<String, TriggerError> {
    let response = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| TriggerError::Request(url.to_string(), e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| TriggerError::Request(url.to_string(), e))?;
    info!("{} responded with {}: {}", url, status, text);

    if !status.is_success() {
        return Err(TriggerError::Status {
            url: url.to_string(),
            status,
            body: text,
        });
    }
    Ok(text)
}
