//! API models for HR analytics metrics and their cache.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::db::handlers::analytics::{Metric, MetricParams};
use crate::errors::Error;
use crate::types::DepartmentId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricInfo {
    pub name: String,
    pub description: String,
}

impl From<Metric> for MetricInfo {
    fn from(metric: Metric) -> Self {
        Self {
            name: metric.name().to_string(),
            description: metric.description().to_string(),
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetricQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub department_id: Option<DepartmentId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

impl MetricQuery {
    pub fn params(&self) -> Result<MetricParams, Error> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(Error::BadRequest {
                    message: "from must not be after to".to_string(),
                });
            }
        }
        Ok(MetricParams {
            department_id: self.department_id,
            from: self.from,
            to: self.to,
        })
    }

    /// Parameters in cache key order
    pub fn key_params(&self) -> [(&'static str, Option<String>); 3] {
        [
            ("department_id", self.department_id.map(|id| id.to_string())),
            ("from", self.from.map(|d| d.to_string())),
            ("to", self.to.map(|d| d.to_string())),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricResult {
    pub metric: String,
    pub generated_at: DateTime<Utc>,
    /// Whether the rows came from the cache
    pub cached: bool,
    #[schema(value_type = Vec<Object>)]
    pub rows: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheKeys {
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvalidateCacheQuery {
    /// Glob over cache keys where `*` matches anything; absent clears the whole cache
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheInvalidated {
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::metric_key;
    use axum::{extract::Query, http::Uri};

    #[test]
    fn test_query_parses_and_keys() {
        let uri: Uri = "/metrics/x?department_id=4&from=2030-01-01".parse().unwrap();
        let Query(query) = Query::<MetricQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.department_id, Some(4));
        let key = metric_key("headcount_by_department", &query.key_params());
        assert_eq!(key, "headcount_by_department:department_id=4:from=2030-01-01:to=-");
    }

    #[test]
    fn test_reversed_range_rejected() {
        let query = MetricQuery {
            from: NaiveDate::from_ymd_opt(2030, 2, 1),
            to: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..Default::default()
        };
        assert!(matches!(query.params(), Err(Error::BadRequest { .. })));
    }
}
