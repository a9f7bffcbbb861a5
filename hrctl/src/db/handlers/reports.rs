//! Read-only aggregate queries behind the reports and the dashboard.

use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::reports::{
            BenefitsReportRow, CompletedRunTotals, DashboardCounts, DashboardSummary, HeadcountRow, HmoClaimsReportRow,
            PayrollSummaryRow,
        },
    },
    types::PayrollRunId,
};

/// Which payslips a payroll summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollScope {
    Run(PayrollRunId),
    /// Runs whose period overlaps the range; either end may be open
    Period { from: Option<NaiveDate>, to: Option<NaiveDate> },
}

pub struct Reports<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reports<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn headcount(&mut self) -> Result<Vec<HeadcountRow>> {
        let rows = sqlx::query_as::<_, HeadcountRow>(
            r#"
            SELECT d.id AS department_id, d.name AS department,
                   COUNT(e.id) FILTER (WHERE e.is_active) AS active,
                   COUNT(e.id) FILTER (WHERE NOT e.is_active) AS inactive,
                   COUNT(e.id) AS total
            FROM departments d
            LEFT JOIN employees e ON e.department_id = d.id
            GROUP BY d.id, d.name
            ORDER BY d.name
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }

    /// Per-employee pay totals. Cancelled runs are excluded.
    #[instrument(skip(self), err)]
    pub async fn payroll_summary(&mut self, scope: PayrollScope) -> Result<Vec<PayrollSummaryRow>> {
        let (run_id, from, to) = match scope {
            PayrollScope::Run(id) => (Some(id), None, None),
            PayrollScope::Period { from, to } => (None, from, to),
        };
        let rows = sqlx::query_as::<_, PayrollSummaryRow>(
            r#"
            SELECT e.id AS employee_id, e.first_name || ' ' || e.last_name AS employee_name, d.name AS department,
                   COUNT(p.id) AS payslips,
                   SUM(p.basic_pay) AS basic_pay, SUM(p.total_bonuses) AS total_bonuses,
                   SUM(p.total_deductions) AS total_deductions, SUM(p.gross_pay) AS gross_pay, SUM(p.net_pay) AS net_pay
            FROM payslips p
            JOIN payroll_runs r ON r.id = p.payroll_run_id
            JOIN employees e ON e.id = p.employee_id
            JOIN departments d ON d.id = e.department_id
            WHERE r.status <> 'Cancelled'
                AND ($1::bigint IS NULL OR r.id = $1::bigint)
                AND ($2::date IS NULL OR r.period_end >= $2::date)
                AND ($3::date IS NULL OR r.period_start <= $3::date)
            GROUP BY e.id, e.first_name, e.last_name, d.name
            ORDER BY d.name, e.last_name, e.first_name
            "#,
        )
        .bind(run_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn benefits(&mut self) -> Result<Vec<BenefitsReportRow>> {
        let rows = sqlx::query_as::<_, BenefitsReportRow>(
            r#"
            SELECT b.id AS benefit_id, b.name AS benefit, c.name AS category,
                   COUNT(eb.id) AS active_assignments,
                   COALESCE(b.value, 0) * COUNT(eb.id) AS total_value
            FROM benefits b
            JOIN benefit_categories c ON c.id = b.category_id
            LEFT JOIN employee_benefits eb ON eb.benefit_id = b.id AND eb.is_active
            WHERE b.is_active
            GROUP BY b.id, b.name, b.value, c.name
            ORDER BY c.name, b.name
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }

    /// Claims by provider, plan and status with service dates inside the range
    #[instrument(skip(self), err)]
    pub async fn hmo_claims(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Vec<HmoClaimsReportRow>> {
        let rows = sqlx::query_as::<_, HmoClaimsReportRow>(
            r#"
            SELECT pr.name AS provider, p.name AS plan, c.status::text AS status,
                   COUNT(c.id) AS claims, SUM(c.amount) AS total_amount
            FROM hmo_claims c
            JOIN hmo_enrollments en ON en.id = c.enrollment_id
            JOIN hmo_plans p ON p.id = en.plan_id
            JOIN hmo_providers pr ON pr.id = p.provider_id
            WHERE ($1::date IS NULL OR c.service_date >= $1::date)
                AND ($2::date IS NULL OR c.service_date <= $2::date)
            GROUP BY pr.name, p.name, c.status
            ORDER BY pr.name, p.name, c.status
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn dashboard(&mut self) -> Result<DashboardSummary> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees WHERE is_active) AS active_employees,
                (SELECT COUNT(*) FROM departments WHERE is_active) AS departments,
                (SELECT COUNT(*) FROM payroll_runs WHERE status IN ('Draft', 'Processing')) AS open_payroll_runs,
                (SELECT COUNT(*) FROM hmo_claims WHERE status IN ('Pending', 'UnderRevision')) AS pending_claims,
                (SELECT COUNT(*) FROM pay_adjustments WHERE status = 'Pending') AS pending_pay_adjustments,
                (SELECT COUNT(*) FROM hmo_enrollments WHERE status = 'Active') AS active_enrollments
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        let last_completed_run = sqlx::query_as::<_, CompletedRunTotals>(
            r#"
            SELECT id AS run_id, period_start, period_end, pay_date, total_gross, total_deductions, total_net
            FROM payroll_runs
            WHERE status = 'Completed'
            ORDER BY period_end DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(DashboardSummary {
            counts,
            last_completed_run,
        })
    }
}
