//! HR analytics metrics, served through the in-memory metrics cache.

use axum::extract::{Path, State};
use chrono::Utc;

use crate::{
    AppState,
    api::{
        extract::ApiQuery,
        models::{
            analytics::{CacheInvalidated, CacheKeys, InvalidateCacheQuery, MetricInfo, MetricQuery, MetricResult},
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    cache::{CachedMetric, metric_key},
    db::handlers::{Analytics, analytics::Metric},
    errors::{Error, Result},
};

/// List the available metrics
#[utoipa::path(
    get,
    path = "/hr_analytics/metrics",
    tag = "hr analytics",
    summary = "List metrics",
    responses(
        (status = 200, description = "Metric catalog", body = Vec<MetricInfo>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_metrics(_: RequiresPermission<resource::Analytics, operation::ReadAll>) -> Result<ApiResponse<Vec<MetricInfo>>> {
    Ok(ApiResponse::ok(Metric::ALL.into_iter().map(MetricInfo::from).collect()))
}

/// Compute a metric, or return its cached rows
#[utoipa::path(
    get,
    path = "/hr_analytics/metrics/{name}",
    tag = "hr analytics",
    summary = "Get metric",
    params(("name" = String, Path, description = "Metric name"), MetricQuery),
    responses(
        (status = 200, description = "Metric rows", body = MetricResult),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Unknown metric"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(metric = %name))]
pub async fn get_metric(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiQuery(query): ApiQuery<MetricQuery>,
    _: RequiresPermission<resource::Analytics, operation::ReadAll>,
) -> Result<ApiResponse<MetricResult>> {
    let metric = Metric::from_name(&name).ok_or_else(|| Error::not_found("Metric", &name))?;
    let params = query.params()?;
    let key = metric_key(metric.name(), &query.key_params());

    if let Some(hit) = state.metrics_cache.get(&key) {
        tracing::debug!(%key, "Metric cache hit");
        return Ok(ApiResponse::ok(MetricResult {
            metric: name,
            generated_at: hit.generated_at,
            cached: true,
            rows: hit.rows,
        }));
    }

    let mut conn = state.db.acquire().await?;
    let rows = Analytics::new(&mut conn).compute(metric, &params).await?;
    let generated_at = Utc::now();
    state.metrics_cache.insert(
        key,
        CachedMetric {
            rows: rows.clone(),
            generated_at,
        },
    );

    Ok(ApiResponse::ok(MetricResult {
        metric: name,
        generated_at,
        cached: false,
        rows,
    }))
}

/// List cached metric keys
#[utoipa::path(
    get,
    path = "/hr_analytics/cache",
    tag = "hr analytics",
    summary = "List cache keys",
    responses(
        (status = 200, description = "Cached keys", body = CacheKeys),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cache(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Analytics, operation::ReadAll>,
) -> Result<ApiResponse<CacheKeys>> {
    Ok(ApiResponse::ok(CacheKeys {
        keys: state.metrics_cache.keys(),
    }))
}

/// Drop cached metrics matching a glob pattern, or all of them
#[utoipa::path(
    delete,
    path = "/hr_analytics/cache",
    tag = "hr analytics",
    summary = "Invalidate cache",
    params(InvalidateCacheQuery),
    responses(
        (status = 200, description = "Entries removed", body = CacheInvalidated),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn invalidate_cache(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InvalidateCacheQuery>,
    _: RequiresPermission<resource::Analytics, operation::Delete>,
) -> Result<ApiResponse<CacheInvalidated>> {
    let pattern = query.pattern.filter(|p| !p.is_empty());
    let removed = state.metrics_cache.invalidate(pattern.as_deref());
    tracing::info!(pattern = ?pattern, removed, "Metrics cache invalidated");
    Ok(ApiResponse::ok(CacheInvalidated { removed }).with_message(format!("Removed {removed} cached entries")))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_metric_is_cached_until_invalidated(pool: PgPool) {
        let manager = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Radiology").await;
        create_test_employee(&pool, "tech@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&manager);

        let first: Value = server
            .get("/api/hr_analytics/metrics/headcount_by_department")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(first["data"]["cached"], false);
        assert_eq!(first["data"]["rows"][0]["headcount"], 1);

        let second: Value = server
            .get("/api/hr_analytics/metrics/headcount_by_department")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(second["data"]["cached"], true);
        assert_eq!(second["data"]["generated_at"], first["data"]["generated_at"]);

        server
            .get(&format!("/api/hr_analytics/metrics/headcount_by_department?department_id={}", department.id))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();

        let keys: Value = server.get("/api/hr_analytics/cache").add_header(&auth.0, &auth.1).await.json();
        assert_eq!(keys["data"]["keys"].as_array().unwrap().len(), 2);

        let removed: Value = server
            .delete("/api/hr_analytics/cache?pattern=headcount_by_department:department_id=-*")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(removed["data"]["removed"], 1);

        let cleared: Value = server.delete("/api/hr_analytics/cache").add_header(&auth.0, &auth.1).await.json();
        assert_eq!(cleared["data"]["removed"], 1);
    }

    #[sqlx::test]
    async fn test_unknown_metric_and_bad_range(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&officer);

        let catalog: Value = server.get("/api/hr_analytics/metrics").add_header(&auth.0, &auth.1).await.json();
        assert_eq!(catalog["data"].as_array().unwrap().len(), 10);

        server
            .get("/api/hr_analytics/metrics/salary_by_star_sign")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/hr_analytics/metrics/new_hires_by_month?from=2025-06-01&to=2025-01-01")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Only HR managers may drop the cache
        server
            .delete("/api/hr_analytics/cache")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_employees_cannot_read_metrics(pool: PgPool) {
        let employee = create_test_user(&pool, Role::Employee).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&employee);
        server
            .get("/api/hr_analytics/metrics")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
