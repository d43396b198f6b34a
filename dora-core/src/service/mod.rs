//! Metric services and the request dispatcher.

mod df_service;
mod df_total_service;

use async_trait::async_trait;

pub use df_service::DfService;
pub use df_total_service::{monthly_to_quarterly, DfTotalService};

use crate::error::ServiceFailure;
use crate::models::{Response, ServiceParameters, TypeQuery};
use crate::sql_client::QueryClient;

/// One metric request in, one [`Response`] out.
#[async_trait]
pub trait MetricService: Send + Sync {
    async fn serve_request(&self, params: &ServiceParameters) -> Result<Response, ServiceFailure>;
}

/// Route a request to the service that answers its query type.
pub async fn serve<C>(client: &C, params: &ServiceParameters) -> Result<Response, ServiceFailure>
where
    C: QueryClient + ?Sized,
{
    match params.type_query {
        TypeQuery::DfTotal => DfTotalService::new(client).serve_request(params).await,
        TypeQuery::DfCount | TypeQuery::DfAverage => {
            DfService::new(client).serve_request(params).await
        }
    }
}
