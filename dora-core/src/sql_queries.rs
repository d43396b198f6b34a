//! SQL statements run against the DevLake MySQL schema.
//!
//! A statement is a granularity base (`*_DEPLOYMENT_SQL`) followed by a
//! metric suffix (`COUNT_SQL` or `AVERAGE_SQL`). Each base is an open
//! `WITH RECURSIVE` chain ending in the CTE
//! `_series(data_key, bucket_start, deployment_count)`; the suffix supplies
//! the final `SELECT` over it.
//!
//! Bind order is always `from`, `to`, `project` (see [`QueryParams`]).
//!
//! [`QueryParams`]: crate::models::QueryParams

use crate::models::{Aggregation, TypeQuery};

/// Binds the three parameters once and resolves the defaults: a missing end
/// is now, a missing start is six months before the end.
macro_rules! params_cte {
    () => {
        r#"
WITH RECURSIVE _bounds AS (
    SELECT
        FROM_UNIXTIME(?)     AS from_ts,
        FROM_UNIXTIME(?)     AS to_ts,
        CAST(? AS CHAR(255)) AS project
),
_params AS (
    SELECT
        COALESCE(from_ts, DATE_SUB(COALESCE(to_ts, NOW()), INTERVAL 6 MONTH)) AS range_start,
        COALESCE(to_ts, NOW())                                                AS range_end,
        project
    FROM _bounds
),
"#
    };
}

/// One row per successful production deployment inside the range, stamped
/// with the time its last commit finished deploying.
macro_rules! deployments_cte {
    () => {
        r#"
_deployments AS (
    SELECT
        cdc.cicd_deployment_id AS deployment_id,
        MAX(cdc.finished_date) AS deployed_at
    FROM cicd_deployment_commits cdc
    JOIN project_mapping pm
        ON cdc.cicd_scope_id = pm.row_id
       AND pm.`table` = 'cicd_scopes'
    JOIN _params p
    WHERE cdc.result = 'SUCCESS'
      AND cdc.environment = 'PRODUCTION'
      AND (p.project IS NULL OR pm.project_name = p.project)
      AND cdc.finished_date BETWEEN p.range_start AND p.range_end
    GROUP BY cdc.cicd_deployment_id
),
"#
    };
}

pub const WEEKLY_DEPLOYMENT_SQL: &str = concat!(
    params_cte!(),
    deployments_cte!(),
    r#"
_calendar AS (
    SELECT DATE_SUB(DATE(range_start), INTERVAL WEEKDAY(range_start) DAY) AS bucket_start
    FROM _params
    UNION ALL
    SELECT c.bucket_start + INTERVAL 1 WEEK
    FROM _calendar c
    JOIN _params p ON c.bucket_start + INTERVAL 1 WEEK <= p.range_end
),
_series AS (
    SELECT
        DATE_FORMAT(c.bucket_start, '%x%v') AS data_key,
        c.bucket_start                      AS bucket_start,
        COUNT(d.deployment_id)              AS deployment_count
    FROM _calendar c
    LEFT JOIN _deployments d
        ON d.deployed_at >= c.bucket_start
       AND d.deployed_at <  c.bucket_start + INTERVAL 1 WEEK
    GROUP BY c.bucket_start, data_key
)
"#
);

pub const MONTHLY_DEPLOYMENT_SQL: &str = concat!(
    params_cte!(),
    deployments_cte!(),
    r#"
_calendar AS (
    SELECT CAST(DATE_FORMAT(range_start, '%Y-%m-01') AS DATE) AS bucket_start
    FROM _params
    UNION ALL
    SELECT c.bucket_start + INTERVAL 1 MONTH
    FROM _calendar c
    JOIN _params p ON c.bucket_start + INTERVAL 1 MONTH <= p.range_end
),
_series AS (
    SELECT
        DATE_FORMAT(c.bucket_start, '%y/%m') AS data_key,
        c.bucket_start                       AS bucket_start,
        COUNT(d.deployment_id)               AS deployment_count
    FROM _calendar c
    LEFT JOIN _deployments d
        ON d.deployed_at >= c.bucket_start
       AND d.deployed_at <  c.bucket_start + INTERVAL 1 MONTH
    GROUP BY c.bucket_start, data_key
)
"#
);

pub const QUARTERLY_DEPLOYMENT_SQL: &str = concat!(
    params_cte!(),
    deployments_cte!(),
    r#"
_calendar AS (
    SELECT MAKEDATE(YEAR(range_start), 1) + INTERVAL (QUARTER(range_start) - 1) QUARTER AS bucket_start
    FROM _params
    UNION ALL
    SELECT c.bucket_start + INTERVAL 1 QUARTER
    FROM _calendar c
    JOIN _params p ON c.bucket_start + INTERVAL 1 QUARTER <= p.range_end
),
_series AS (
    SELECT
        DATE_FORMAT(c.bucket_start, '%Y-%m-%d') AS data_key,
        c.bucket_start                          AS bucket_start,
        COUNT(d.deployment_id)                  AS deployment_count
    FROM _calendar c
    LEFT JOIN _deployments d
        ON d.deployed_at >= c.bucket_start
       AND d.deployed_at <  c.bucket_start + INTERVAL 1 QUARTER
    GROUP BY c.bucket_start, data_key
)
"#
);

/// Deployments per bucket.
pub const COUNT_SQL: &str = r#"
SELECT
    data_key,
    CAST(deployment_count AS DOUBLE) AS value
FROM _series
ORDER BY bucket_start DESC
"#;

/// Rolling mean of the current bucket and the three before it.
pub const AVERAGE_SQL: &str = r#"
SELECT
    data_key,
    CAST(
        AVG(deployment_count) OVER (ORDER BY bucket_start ROWS BETWEEN 3 PRECEDING AND CURRENT ROW)
        AS DOUBLE
    ) AS value
FROM _series
ORDER BY bucket_start DESC
"#;

pub fn base_for(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::Weekly    => WEEKLY_DEPLOYMENT_SQL,
        Aggregation::Monthly   => MONTHLY_DEPLOYMENT_SQL,
        Aggregation::Quarterly => QUARTERLY_DEPLOYMENT_SQL,
    }
}

/// Full statement for a count or average request. `df_total` has no single
/// statement and yields `None`.
pub fn resolve(type_query: TypeQuery, aggregation: Aggregation) -> Option<String> {
    let suffix = match type_query {
        TypeQuery::DfCount   => COUNT_SQL,
        TypeQuery::DfAverage => AVERAGE_SQL,
        TypeQuery::DfTotal   => return None,
    };
    Some(format!("{}{}", base_for(aggregation), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn six_distinct_statements() {
        let mut seen = HashSet::new();
        for tq in [TypeQuery::DfCount, TypeQuery::DfAverage] {
            for agg in [Aggregation::Weekly, Aggregation::Monthly, Aggregation::Quarterly] {
                seen.insert(resolve(tq, agg).unwrap());
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn total_has_no_single_statement() {
        assert_eq!(resolve(TypeQuery::DfTotal, Aggregation::Weekly), None);
    }

    #[test]
    fn statement_is_base_then_suffix() {
        let sql = resolve(TypeQuery::DfAverage, Aggregation::Monthly).unwrap();
        assert!(sql.starts_with(MONTHLY_DEPLOYMENT_SQL));
        assert!(sql.ends_with(AVERAGE_SQL));
    }

    #[test]
    fn every_statement_binds_three_params() {
        for agg in [Aggregation::Weekly, Aggregation::Monthly, Aggregation::Quarterly] {
            let sql = resolve(TypeQuery::DfCount, agg).unwrap();
            assert_eq!(sql.matches('?').count(), 3, "{agg}");
        }
    }
}
