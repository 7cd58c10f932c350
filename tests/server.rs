use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::net::SocketAddr;
use weather_etl::{
    CurrentWeather, DatasetRef, FetchError, ForecastResponse, Location, LocationRegistry,
    MemoryWarehouse, TableWriter, WeatherPipeline, WeatherSource, SUCCESS_STATUS,
};

struct StaticSource;

#[async_trait]
impl WeatherSource for StaticSource {
    async fn current(&self, location: &Location) -> Result<CurrentWeather, FetchError> {
        Ok(serde_json::from_value(json!({"name": location.name, "dt": 1700000000})).unwrap())
    }

    async fn forecast(&self, location: &Location) -> Result<ForecastResponse, FetchError> {
        Ok(serde_json::from_value(json!({
            "city": {"name": location.name},
            "list": [
                {"dt": 1700000000, "weather": [{"id": 800}]},
                {"dt": 1700010800, "weather": [{"id": 801}]}
            ]
        }))
        .unwrap())
    }
}

async fn spawn_server(warehouse: MemoryWarehouse) -> String {
    let writer = TableWriter::builder()
        .warehouse(warehouse)
        .project_id("p")
        .dataset_id("d")
        .build();
    let pipeline = WeatherPipeline::builder()
        .source(StaticSource)
        .writer(writer)
        .locations(LocationRegistry::new(vec![Location::new("Paris", 48.85, 2.35)]).unwrap())
        .build();

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, weather_etl::server::router(pipeline))
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_post_runs_pipeline() {
    let warehouse = MemoryWarehouse::new();
    let url = spawn_server(warehouse.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{url}/run"))
        .json(&json!({"source": "scheduler"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), SUCCESS_STATUS);
    let dataset = DatasetRef::new("p", "d");
    assert_eq!(
        warehouse.row_count(&dataset.table("forecasted_weather")).await,
        Some(2)
    );
}

#[tokio::test]
async fn test_raw_text_body_is_accepted() {
    let url = spawn_server(MemoryWarehouse::new()).await;

    let response = reqwest::Client::new()
        .post(&url)
        .header("content-type", "text/plain")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let warehouse = MemoryWarehouse::new();
    let url = spawn_server(warehouse.clone()).await;

    let response = reqwest::Client::new()
        .post(&url)
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(warehouse.jobs_run().await, 0);
}

#[tokio::test]
async fn test_invoke_remote_returns_status_text() {
    let url = spawn_server(MemoryWarehouse::new()).await;
    let text = weather_etl::invoke_remote(&url, &json!({})).await.unwrap();
    assert_eq!(text, SUCCESS_STATUS);
}
