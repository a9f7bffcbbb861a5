//! Named HR metrics.
//!
//! Each metric is one aggregate query. Every query takes the same three optional parameters,
//! `$1` department id, `$2` from date and `$3` to date, and treats NULL as "no filter". The
//! result rows are aggregated to JSON by Postgres so metrics can differ in shape without a
//! row type each.

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgConnection;
use tracing::instrument;

use crate::{db::errors::Result, types::DepartmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    HeadcountByDepartment,
    HeadcountByBranch,
    HeadcountByEmploymentType,
    NewHiresByMonth,
    AverageSalaryByDepartment,
    PayrollCostByRun,
    BenefitEnrollmentByCategory,
    HmoClaimsByStatus,
    HmoEnrollmentByPlan,
    TurnoverByMonth,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::HeadcountByDepartment,
        Metric::HeadcountByBranch,
        Metric::HeadcountByEmploymentType,
        Metric::NewHiresByMonth,
        Metric::AverageSalaryByDepartment,
        Metric::PayrollCostByRun,
        Metric::BenefitEnrollmentByCategory,
        Metric::HmoClaimsByStatus,
        Metric::HmoEnrollmentByPlan,
        Metric::TurnoverByMonth,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::HeadcountByDepartment => "headcount_by_department",
            Metric::HeadcountByBranch => "headcount_by_branch",
            Metric::HeadcountByEmploymentType => "headcount_by_employment_type",
            Metric::NewHiresByMonth => "new_hires_by_month",
            Metric::AverageSalaryByDepartment => "average_salary_by_department",
            Metric::PayrollCostByRun => "payroll_cost_by_run",
            Metric::BenefitEnrollmentByCategory => "benefit_enrollment_by_category",
            Metric::HmoClaimsByStatus => "hmo_claims_by_status",
            Metric::HmoEnrollmentByPlan => "hmo_enrollment_by_plan",
            Metric::TurnoverByMonth => "turnover_by_month",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::HeadcountByDepartment => "Active employees per department, filtered on hire date",
            Metric::HeadcountByBranch => "Active employees per branch, filtered on hire date",
            Metric::HeadcountByEmploymentType => "Active employees per employment type, filtered on hire date",
            Metric::NewHiresByMonth => "Employees hired per calendar month",
            Metric::AverageSalaryByDepartment => "Average, minimum and maximum current base salary per department",
            Metric::PayrollCostByRun => "Gross, deduction and net totals of every non-cancelled payroll run",
            Metric::BenefitEnrollmentByCategory => "Active benefit assignments per benefit category",
            Metric::HmoClaimsByStatus => "Number and total amount of HMO claims per status, filtered on service date",
            Metric::HmoEnrollmentByPlan => "Active HMO enrollments and monthly employee share per plan",
            Metric::TurnoverByMonth => "Hires and separations per calendar month",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Metric::HeadcountByDepartment => {
                r#"
                SELECT d.id AS department_id, d.name AS department, COUNT(e.id) AS headcount
                FROM departments d
                LEFT JOIN employees e ON e.department_id = d.id AND e.is_active
                    AND ($2::date IS NULL OR e.hire_date >= $2::date)
                    AND ($3::date IS NULL OR e.hire_date <= $3::date)
                WHERE d.is_active AND ($1::bigint IS NULL OR d.id = $1::bigint)
                GROUP BY d.id, d.name
                ORDER BY d.name
                "#
            }
            Metric::HeadcountByBranch => {
                r#"
                SELECT b.id AS branch_id, b.name AS branch, COUNT(e.id) AS headcount
                FROM branches b
                LEFT JOIN employees e ON e.branch_id = b.id AND e.is_active
                    AND ($1::bigint IS NULL OR e.department_id = $1::bigint)
                    AND ($2::date IS NULL OR e.hire_date >= $2::date)
                    AND ($3::date IS NULL OR e.hire_date <= $3::date)
                WHERE b.is_active
                GROUP BY b.id, b.name
                ORDER BY b.name
                "#
            }
            Metric::HeadcountByEmploymentType => {
                r#"
                SELECT e.employment_type::text AS employment_type, COUNT(*) AS headcount
                FROM employees e
                WHERE e.is_active
                    AND ($1::bigint IS NULL OR e.department_id = $1::bigint)
                    AND ($2::date IS NULL OR e.hire_date >= $2::date)
                    AND ($3::date IS NULL OR e.hire_date <= $3::date)
                GROUP BY e.employment_type
                ORDER BY e.employment_type
                "#
            }
            Metric::NewHiresByMonth => {
                r#"
                SELECT TO_CHAR(DATE_TRUNC('month', e.hire_date), 'YYYY-MM') AS month, COUNT(*) AS hires
                FROM employees e
                WHERE ($1::bigint IS NULL OR e.department_id = $1::bigint)
                    AND ($2::date IS NULL OR e.hire_date >= $2::date)
                    AND ($3::date IS NULL OR e.hire_date <= $3::date)
                GROUP BY 1
                ORDER BY 1
                "#
            }
            Metric::AverageSalaryByDepartment => {
                r#"
                SELECT d.id AS department_id, d.name AS department, COUNT(s.id) AS employees,
                       ROUND(AVG(s.base_salary), 2) AS average_salary,
                       MIN(s.base_salary) AS min_salary, MAX(s.base_salary) AS max_salary
                FROM departments d
                JOIN employees e ON e.department_id = d.id AND e.is_active
                JOIN salaries s ON s.employee_id = e.id AND s.is_current
                WHERE ($1::bigint IS NULL OR d.id = $1::bigint)
                    AND ($2::date IS NULL OR s.effective_date >= $2::date)
                    AND ($3::date IS NULL OR s.effective_date <= $3::date)
                GROUP BY d.id, d.name
                ORDER BY d.name
                "#
            }
            Metric::PayrollCostByRun => {
                r#"
                SELECT r.id AS run_id, r.period_start, r.period_end, r.status::text AS status,
                       COUNT(p.id) AS payslips,
                       COALESCE(SUM(p.gross_pay), 0) AS gross_pay,
                       COALESCE(SUM(p.total_deductions), 0) AS total_deductions,
                       COALESCE(SUM(p.net_pay), 0) AS net_pay
                FROM payroll_runs r
                LEFT JOIN payslips p ON p.payroll_run_id = r.id
                    AND ($1::bigint IS NULL OR p.employee_id IN (SELECT id FROM employees WHERE department_id = $1::bigint))
                WHERE r.status <> 'Cancelled'
                    AND ($2::date IS NULL OR r.period_start >= $2::date)
                    AND ($3::date IS NULL OR r.period_end <= $3::date)
                GROUP BY r.id
                ORDER BY r.period_start, r.id
                "#
            }
            Metric::BenefitEnrollmentByCategory => {
                r#"
                SELECT c.id AS category_id, c.name AS category, COUNT(eb.id) AS active_assignments
                FROM benefit_categories c
                LEFT JOIN benefits b ON b.category_id = c.id
                LEFT JOIN employee_benefits eb ON eb.benefit_id = b.id AND eb.is_active
                    AND ($1::bigint IS NULL OR eb.employee_id IN (SELECT id FROM employees WHERE department_id = $1::bigint))
                    AND ($2::date IS NULL OR eb.start_date >= $2::date)
                    AND ($3::date IS NULL OR eb.start_date <= $3::date)
                WHERE c.is_active
                GROUP BY c.id, c.name
                ORDER BY c.name
                "#
            }
            Metric::HmoClaimsByStatus => {
                r#"
                SELECT c.status::text AS status, COUNT(*) AS claims, SUM(c.amount) AS total_amount
                FROM hmo_claims c
                JOIN hmo_enrollments en ON en.id = c.enrollment_id
                JOIN employees e ON e.id = en.employee_id
                WHERE ($1::bigint IS NULL OR e.department_id = $1::bigint)
                    AND ($2::date IS NULL OR c.service_date >= $2::date)
                    AND ($3::date IS NULL OR c.service_date <= $3::date)
                GROUP BY c.status
                ORDER BY c.status
                "#
            }
            Metric::HmoEnrollmentByPlan => {
                r#"
                SELECT p.id AS plan_id, p.name AS plan, pr.name AS provider,
                       COUNT(en.id) AS active_enrollments,
                       COALESCE(SUM(p.employee_share) FILTER (WHERE en.id IS NOT NULL), 0) AS monthly_employee_share
                FROM hmo_plans p
                JOIN hmo_providers pr ON pr.id = p.provider_id
                LEFT JOIN hmo_enrollments en ON en.plan_id = p.id AND en.status = 'Active'
                    AND ($1::bigint IS NULL OR en.employee_id IN (SELECT id FROM employees WHERE department_id = $1::bigint))
                    AND ($2::date IS NULL OR en.start_date >= $2::date)
                    AND ($3::date IS NULL OR en.start_date <= $3::date)
                WHERE p.is_active
                GROUP BY p.id, p.name, pr.name
                ORDER BY pr.name, p.name
                "#
            }
            // Employees carry no termination date; deactivation time stands in for it
            Metric::TurnoverByMonth => {
                r#"
                WITH hires AS (
                    SELECT DATE_TRUNC('month', hire_date)::date AS month, COUNT(*) AS hires
                    FROM employees
                    WHERE ($1::bigint IS NULL OR department_id = $1::bigint)
                    GROUP BY 1
                ), separations AS (
                    SELECT DATE_TRUNC('month', updated_at)::date AS month, COUNT(*) AS separations
                    FROM employees
                    WHERE NOT is_active AND ($1::bigint IS NULL OR department_id = $1::bigint)
                    GROUP BY 1
                )
                SELECT TO_CHAR(COALESCE(h.month, s.month), 'YYYY-MM') AS month,
                       COALESCE(h.hires, 0) AS hires, COALESCE(s.separations, 0) AS separations
                FROM hires h
                FULL OUTER JOIN separations s ON s.month = h.month
                WHERE ($2::date IS NULL OR COALESCE(h.month, s.month) >= DATE_TRUNC('month', $2::date)::date)
                    AND ($3::date IS NULL OR COALESCE(h.month, s.month) <= $3::date)
                ORDER BY 1
                "#
            }
        }
    }
}

/// Optional filters every metric accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricParams {
    pub department_id: Option<DepartmentId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub struct Analytics<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Analytics<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Compute `metric`, returning its rows as a JSON array
    #[instrument(skip(self), fields(metric = metric.name()), err)]
    pub async fn compute(&mut self, metric: Metric, params: &MetricParams) -> Result<Value> {
        let query = format!(
            "SELECT COALESCE(json_agg(row_to_json(m)), '[]'::json) FROM ({}) m",
            metric.sql()
        );
        let rows = sqlx::query_scalar::<_, Value>(&query)
            .bind(params.department_id)
            .bind(params.from)
            .bind(params.to)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_department, create_test_employee};
    use sqlx::PgPool;

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(Metric::from_name("salary_by_star_sign"), None);
    }

    #[sqlx::test]
    async fn test_every_metric_runs_on_empty_database(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut analytics = Analytics::new(&mut conn);
        for metric in Metric::ALL {
            let rows = analytics.compute(metric, &MetricParams::default()).await.unwrap();
            assert!(rows.is_array(), "{} did not return an array", metric.name());
        }
    }

    #[sqlx::test]
    async fn test_headcount_respects_department_filter(pool: PgPool) {
        let icu = create_test_department(&pool, "ICU").await;
        let er = create_test_department(&pool, "Emergency").await;
        create_test_employee(&pool, "a@hospital.local", icu.id).await;
        create_test_employee(&pool, "b@hospital.local", icu.id).await;
        create_test_employee(&pool, "c@hospital.local", er.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut analytics = Analytics::new(&mut conn);

        let all = analytics
            .compute(Metric::HeadcountByDepartment, &MetricParams::default())
            .await
            .unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let params = MetricParams {
            department_id: Some(icu.id),
            ..Default::default()
        };
        let icu_only = analytics.compute(Metric::HeadcountByDepartment, &params).await.unwrap();
        let rows = icu_only.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["department"], "ICU");
        assert_eq!(rows[0]["headcount"], 2);
    }
}
