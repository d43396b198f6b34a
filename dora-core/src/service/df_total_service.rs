//! Total deployment frequency.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use super::MetricService;
use crate::error::{ServiceError, ServiceFailure};
use crate::models::{Aggregation, DataPoint, Response, ServiceParameters};
use crate::sql_client::QueryClient;
use crate::sql_queries;

/// Answers `df_total` from the weekly and monthly count series.
///
/// Both series are always fetched, weekly first. The first failure ends the
/// request, so a weekly error hides whatever the monthly query would have
/// returned.
pub struct DfTotalService<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: QueryClient + ?Sized> DfTotalService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C: QueryClient + ?Sized> MetricService for DfTotalService<'a, C> {
    async fn serve_request(&self, params: &ServiceParameters) -> Result<Response, ServiceFailure> {
        let query_params = params.query_params();
        let count_sql = |agg| format!("{}{}", sql_queries::base_for(agg), sql_queries::COUNT_SQL);

        let weekly = self
            .client
            .query_deployments(&count_sql(Aggregation::Weekly), &query_params)
            .await
            .map_err(|e| ServiceFailure::new(Response::empty(params.aggregation), e))?;

        let monthly = self
            .client
            .query_deployments(&count_sql(Aggregation::Monthly), &query_params)
            .await
            .map_err(|e| ServiceFailure::new(Response::empty(params.aggregation), e))?;

        let points = match params.aggregation {
            Aggregation::Weekly => weekly,
            Aggregation::Monthly => monthly,
            Aggregation::Quarterly => monthly_to_quarterly(&monthly)
                .map_err(|e| ServiceFailure::new(Response::empty(params.aggregation), e))?,
        };

        debug!(
            aggregation = %params.aggregation,
            points = points.len(),
            "total deployment frequency served"
        );
        Ok(Response::with_points(params.aggregation, points))
    }
}

/// Collapse a `"yy/mm"` monthly series into quarters keyed by their start
/// date (`"2023-04-01"`). Values are summed; quarters keep the order in which
/// their first month appears.
pub fn monthly_to_quarterly(monthly: &[DataPoint]) -> Result<Vec<DataPoint>, ServiceError> {
    let mut quarters: Vec<DataPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in monthly {
        let key = quarter_key(&point.key)?;
        match index.get(&key) {
            Some(&i) => quarters[i].value += point.value,
            None => {
                index.insert(key.clone(), quarters.len());
                quarters.push(DataPoint::new(key, point.value));
            }
        }
    }

    Ok(quarters)
}

fn quarter_key(month_key: &str) -> Result<String, ServiceError> {
    let malformed = || ServiceError::MalformedBucketKey(month_key.to_string());

    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());

    let (yy, mm) = month_key.split_once('/').ok_or_else(malformed)?;
    if !two_digits(yy) || !two_digits(mm) {
        return Err(malformed());
    }
    let year: i32 = yy.parse().map_err(|_| malformed())?;
    let month: u32 = mm.parse().map_err(|_| malformed())?;
    if !(1..=12).contains(&month) {
        return Err(malformed());
    }

    let quarter_month = (month - 1) / 3 * 3 + 1;
    let start = NaiveDate::from_ymd_opt(2000 + year, quarter_month, 1).ok_or_else(malformed)?;
    Ok(start.format("%Y-%m-%d").to_string())
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
