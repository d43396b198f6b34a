//! Axum HTTP handlers for the DORA metrics API.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use dora_core::{
    models::{Aggregation, Response, ServiceParameters, TypeQuery},
    service,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{error::ApiError, AppState};

/// Query string accepted by `GET /dora/api/metric`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricQuery {
    #[serde(rename = "type")]
    pub type_query: TypeQuery,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub project: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub from: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub to: Option<i64>,
}

impl MetricQuery {
    fn into_params(self) -> Result<ServiceParameters, ApiError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::BadRequest(format!(
                    "'from' ({from}) must not be after 'to' ({to})"
                )));
            }
        }

        Ok(ServiceParameters {
            type_query: self.type_query,
            aggregation: self.aggregation,
            project: self.project,
            from: self.from,
            to: self.to,
        })
    }
}

// ------------------------------------------------------------------ //
//  GET /dora/api/metric                                               //
// ------------------------------------------------------------------ //

pub async fn get_metric(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MetricQuery>, QueryRejection>,
) -> Result<Json<Response>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let params = query.into_params()?;

    match service::serve(state.client.as_ref(), &params).await {
        Ok(resp) => {
            info!(
                type_query = %params.type_query,
                aggregation = %params.aggregation,
                project = params.project.as_deref().unwrap_or(""),
                "metric request served"
            );
            Ok(Json(resp))
        }
        Err(failure) => {
            error!(
                error = %failure,
                type_query = %params.type_query,
                aggregation = %params.aggregation,
                "metric request failed"
            );
            Err(failure.into())
        }
    }
}

// ------------------------------------------------------------------ //
//  Health                                                             //
// ------------------------------------------------------------------ //

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
