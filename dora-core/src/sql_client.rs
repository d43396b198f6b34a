//! QueryClient trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool, Row};
use thiserror::Error;
use tracing::debug;

use crate::models::{DataPoint, QueryParams};

/// Failure reported by a query client. Displays the underlying message and
/// nothing else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct QueryError(pub String);

impl QueryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(e: sqlx::Error) -> Self {
        Self(e.to_string())
    }
}

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// Runs a finished deployment statement and returns its `(key, value)` rows
/// in result order.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn query_deployments(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Vec<DataPoint>, QueryError>;
}

// ------------------------------------------------------------------ //
//  SqlClient (production)                                             //
// ------------------------------------------------------------------ //

/// MySQL-backed client for the DevLake database.
#[derive(Clone)]
pub struct SqlClient {
    pool: MySqlPool,
}

impl SqlClient {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl QueryClient for SqlClient {
    async fn query_deployments(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Vec<DataPoint>, QueryError> {
        let rows = sqlx::query(sql)
            .bind(params.from)
            .bind(params.to)
            .bind(params.project.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let points = rows
            .iter()
            .map(|r| -> Result<DataPoint, sqlx::Error> {
                Ok(DataPoint {
                    key: r.try_get("data_key")?,
                    value: r.try_get::<Option<f64>, _>("value")?.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = points.len(), "deployment query returned");
        Ok(points)
    }
}

// ------------------------------------------------------------------ //
//  MockClient (for tests)                                             //
// ------------------------------------------------------------------ //

/// Canned result for one statement.
#[derive(Debug, Clone)]
pub enum MockDataReturn {
    Data(Vec<DataPoint>),
    Err(String),
}

/// In-memory client keyed by statement text. Records every statement it is
/// asked to run together with the bind values it received.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_data: HashMap<String, MockDataReturn>,
    pub calls: Arc<Mutex<Vec<(String, QueryParams)>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, sql: impl Into<String>, points: Vec<DataPoint>) -> Self {
        self.mock_data.insert(sql.into(), MockDataReturn::Data(points));
        self
    }

    pub fn with_error(mut self, sql: impl Into<String>, msg: impl Into<String>) -> Self {
        self.mock_data.insert(sql.into(), MockDataReturn::Err(msg.into()));
        self
    }

    /// Statements executed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(sql, _)| sql.clone()).collect())
            .unwrap_or_default()
    }

    /// Bind values received so far, in call order.
    pub fn params_seen(&self) -> Vec<QueryParams> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(_, params)| params.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryClient for MockClient {
    async fn query_deployments(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Vec<DataPoint>, QueryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((sql.to_string(), params.clone()));
        }
        match self.mock_data.get(sql) {
            Some(MockDataReturn::Data(points)) => Ok(points.clone()),
            Some(MockDataReturn::Err(msg)) => Err(QueryError::new(msg.clone())),
            None => Err(QueryError::new("no mock data for query")),
        }
    }
}
