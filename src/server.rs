//! HTTP trigger endpoint.
//!
//! `POST /` and `POST /run` start a run and answer with the plain-text
//! status. One run at a time per process.

use crate::error::EtlError;
use crate::pipeline::WeatherPipeline;
use crate::trigger::InboundPayload;
use crate::utils::error_chain;
use crate::warehouse::Warehouse;
use crate::weather::fetcher::WeatherSource;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

struct AppState<S, W> {
    pipeline: WeatherPipeline<S, W>,
    run_lock: Mutex<()>,
}

pub fn router<S, W>(pipeline: WeatherPipeline<S, W>) -> Router
where
    S: WeatherSource + 'static,
    W: Warehouse + 'static,
{
    let state = Arc::new(AppState {
        pipeline,
        run_lock: Mutex::new(()),
    });
    Router::new()
        .route("/", post(handle_run::<S, W>))
        .route("/run", post(handle_run::<S, W>))
        .with_state(state)
}

/// Serves the trigger endpoint until the process receives Ctrl+C.
pub async fn serve<S, W>(addr: SocketAddr, pipeline: WeatherPipeline<S, W>) -> std::io::Result<()>
where
    S: WeatherSource + 'static,
    W: Warehouse + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await
}

async fn handle_run<S, W>(
    State(state): State<Arc<AppState<S, W>>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String)
where
    S: WeatherSource + 'static,
    W: Warehouse + 'static,
{
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let payload = match InboundPayload::from_http(content_type, &body) {
        Ok(payload) => payload,
        Err(e) => return (StatusCode::BAD_REQUEST, error_chain(&e)),
    };

    let _guard = state.run_lock.lock().await;
    match state.pipeline.handle(payload).await {
        Ok(status) => (StatusCode::OK, status.to_string()),
        Err(e @ EtlError::Trigger(_)) => (StatusCode::BAD_REQUEST, error_chain(&e)),
        Err(e) => {
            let message = error_chain(&e);
            error!("Run failed: {}", message);
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}
