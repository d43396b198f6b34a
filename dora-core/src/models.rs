//! Request and response models shared by the services and the HTTP API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------ //
//  Series                                                             //
// ------------------------------------------------------------------ //

/// A single bucket of a deployment-frequency series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Bucket label: `"202338"` (year-week), `"23/04"` (month) or
    /// `"2024-01-01"` (quarter start).
    pub key: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Body returned for every metric request.
///
/// `data_points` is `None` whenever the request failed, so a failed request
/// serialises as `{"aggregation": "...", "dataPoints": null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub aggregation: Aggregation,
    pub data_points: Option<Vec<DataPoint>>,
}

impl Response {
    pub fn empty(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            data_points: None,
        }
    }

    pub fn with_points(aggregation: Aggregation, data_points: Vec<DataPoint>) -> Self {
        Self {
            aggregation,
            data_points: Some(data_points),
        }
    }
}

// ------------------------------------------------------------------ //
//  Request parameters                                                 //
// ------------------------------------------------------------------ //

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseParamError {
    kind: &'static str,
    value: String,
}

/// Which deployment-frequency metric is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeQuery {
    #[serde(rename = "df_count")]
    DfCount,
    #[serde(rename = "df_average")]
    DfAverage,
    #[serde(rename = "df_total")]
    DfTotal,
}

impl TypeQuery {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeQuery::DfCount   => "df_count",
            TypeQuery::DfAverage => "df_average",
            TypeQuery::DfTotal   => "df_total",
        }
    }
}

impl fmt::Display for TypeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeQuery {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "df_count"   => Ok(TypeQuery::DfCount),
            "df_average" => Ok(TypeQuery::DfAverage),
            "df_total"   => Ok(TypeQuery::DfTotal),
            other => Err(ParseParamError {
                kind: "query type",
                value: other.to_string(),
            }),
        }
    }
}

/// Bucket granularity of the returned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Weekly,
    Monthly,
    Quarterly,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Weekly    => "weekly",
            Aggregation::Monthly   => "monthly",
            Aggregation::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly"    => Ok(Aggregation::Weekly),
            "monthly"   => Ok(Aggregation::Monthly),
            "quarterly" => Ok(Aggregation::Quarterly),
            other => Err(ParseParamError {
                kind: "aggregation",
                value: other.to_string(),
            }),
        }
    }
}

/// Everything a service needs to answer one metric request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceParameters {
    pub type_query: TypeQuery,
    pub aggregation: Aggregation,
    pub project: Option<String>,
    /// Unix seconds, inclusive.
    pub from: Option<i64>,
    /// Unix seconds, inclusive.
    pub to: Option<i64>,
}

impl ServiceParameters {
    pub fn new(type_query: TypeQuery, aggregation: Aggregation) -> Self {
        Self {
            type_query,
            aggregation,
            project: None,
            from: None,
            to: None,
        }
    }

    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            project: self.project.clone().filter(|p| !p.is_empty()),
            from: self.from,
            to: self.to,
        }
    }
}

/// Bind values passed to the query client alongside the statement text.
///
/// Every statement binds them in the order `from`, `to`, `project`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub project: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
