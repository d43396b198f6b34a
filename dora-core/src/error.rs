//! Service error types.

use thiserror::Error;

use crate::models::{Response, TypeQuery};
use crate::sql_client::QueryError;

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    /// Passed through untouched so callers see the client's own message.
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("query type '{0}' is not served by this service")]
    UnsupportedQuery(TypeQuery),
    #[error("malformed bucket key '{0}'")]
    MalformedBucketKey(String),
}

/// A failed request: the error plus the response the caller still gets,
/// which echoes the requested aggregation and carries no data points.
#[derive(Debug, Error, PartialEq)]
#[error("{error}")]
pub struct ServiceFailure {
    pub response: Response,
    #[source]
    pub error: ServiceError,
}

impl ServiceFailure {
    pub fn new(response: Response, error: impl Into<ServiceError>) -> Self {
        Self {
            response,
            error: error.into(),
        }
    }
}
