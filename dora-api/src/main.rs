//! DORA metrics API — deployment frequency over HTTP.
//!
//! Decodes metric requests from the query string, answers them from the
//! DevLake MySQL database through `dora-core`, and returns the series as
//! JSON for the dashboard.
//!
//! # Configuration
//!
//! | Env var                    | Default          |
//! |----------------------------|------------------|
//! | `DORA_API_ADDR`            | `0.0.0.0:10666`  |
//! | `DATABASE_URL`             | required         |
//! | `DATABASE_MAX_CONNECTIONS` | `5`              |

mod config;
mod error;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use dora_core::sql_client::{QueryClient, SqlClient};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ApiConfig;

// ------------------------------------------------------------------ //
//  Shared application state                                           //
// ------------------------------------------------------------------ //

/// Shared state injected into every Axum handler via `State`.
pub struct AppState {
    pub client: Arc<dyn QueryClient>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/dora/api/metric", get(handlers::get_metric))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ------------------------------------------------------------------ //
//  Entry point                                                        //
// ------------------------------------------------------------------ //

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dora_api=info".parse()?),
        )
        .json()
        .init();

    let config = ApiConfig::from_env()?;

    let client = SqlClient::connect(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to the DevLake database")?;
    info!(max_connections = config.max_connections, "DevLake pool connected");

    let state = Arc::new(AppState {
        client: Arc::new(client),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "dora-api listening");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use dora_core::{
        models::{DataPoint, QueryParams},
        sql_client::MockClient,
        sql_queries::{COUNT_SQL, MONTHLY_DEPLOYMENT_SQL, WEEKLY_DEPLOYMENT_SQL},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn weekly_sql() -> String {
        format!("{WEEKLY_DEPLOYMENT_SQL}{COUNT_SQL}")
    }

    fn monthly_sql() -> String {
        format!("{MONTHLY_DEPLOYMENT_SQL}{COUNT_SQL}")
    }

    fn app(client: MockClient) -> Router {
        router(Arc::new(AppState {
            client: Arc::new(client),
        }))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(app(MockClient::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn weekly_count_is_served() {
        let client = MockClient::new().with_data(
            weekly_sql(),
            vec![
                DataPoint::new("202338", 0.0),
                DataPoint::new("202337", 1.0),
                DataPoint::new("202336", 2.0),
            ],
        );

        let (status, body) = get(
            app(client.clone()),
            "/dora/api/metric?type=df_count&aggregation=weekly&project=shop&from=1690000000&to=1695000000",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "aggregation": "weekly",
                "dataPoints": [
                    {"key": "202338", "value": 0.0},
                    {"key": "202337", "value": 1.0},
                    {"key": "202336", "value": 2.0}
                ]
            })
        );
        assert_eq!(
            client.params_seen(),
            vec![QueryParams {
                project: Some("shop".into()),
                from: Some(1690000000),
                to: Some(1695000000),
            }]
        );
    }

    #[tokio::test]
    async fn total_monthly_is_served() {
        let client = MockClient::new()
            .with_data(weekly_sql(), vec![DataPoint::new("202338", 3.0)])
            .with_data(monthly_sql(), vec![DataPoint::new("23/04", 6.0)]);

        let (status, body) = get(app(client), "/dora/api/metric?type=df_total&aggregation=monthly").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"aggregation": "monthly", "dataPoints": [{"key": "23/04", "value": 6.0}]})
        );
    }

    #[tokio::test]
    async fn query_failure_is_internal_error_with_message() {
        let client = MockClient::new().with_error(weekly_sql(), "error from weekly query");

        let (status, body) = get(app(client), "/dora/api/metric?type=df_total&aggregation=weekly").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "error from weekly query"}));
    }

    #[tokio::test]
    async fn unknown_type_is_bad_request() {
        let (status, body) = get(
            app(MockClient::new()),
            "/dora/api/metric?type=df_median&aggregation=weekly",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn missing_aggregation_is_bad_request() {
        let (status, _) = get(app(MockClient::new()), "/dora/api/metric?type=df_count").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inverted_range_is_bad_request() {
        let client = MockClient::new();
        let (status, body) = get(
            app(client.clone()),
            "/dora/api/metric?type=df_count&aggregation=monthly&from=20&to=10",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "'from' (20) must not be after 'to' (10)"}));
        assert!(client.calls().is_empty());
    }
}
