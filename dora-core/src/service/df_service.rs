//! Count and average deployment frequency.

use async_trait::async_trait;
use tracing::debug;

use super::MetricService;
use crate::error::{ServiceError, ServiceFailure};
use crate::models::{Response, ServiceParameters};
use crate::sql_client::QueryClient;
use crate::sql_queries;

/// Answers `df_count` and `df_average` with one statement whose rows are
/// returned as-is.
pub struct DfService<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: QueryClient + ?Sized> DfService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C: QueryClient + ?Sized> MetricService for DfService<'a, C> {
    async fn serve_request(&self, params: &ServiceParameters) -> Result<Response, ServiceFailure> {
        let empty = Response::empty(params.aggregation);

        let sql = sql_queries::resolve(params.type_query, params.aggregation).ok_or_else(|| {
            ServiceFailure::new(
                empty.clone(),
                ServiceError::UnsupportedQuery(params.type_query),
            )
        })?;

        let points = self
            .client
            .query_deployments(&sql, &params.query_params())
            .await
            .map_err(|e| ServiceFailure::new(empty, e))?;

        debug!(
            type_query = %params.type_query,
            aggregation = %params.aggregation,
            points = points.len(),
            "deployment frequency served"
        );
        Ok(Response::with_points(params.aggregation, points))
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
