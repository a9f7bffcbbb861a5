//! Database repositories for payroll runs and payslips.

use chrono::Utc;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, paginate},
        },
        models::payroll::{
            PayrollRunCreateDBRequest, PayrollRunDBResponse, PayrollRunUpdateDBRequest, PayslipDBResponse, PayslipInputs,
        },
    },
    lifecycle::PayrollRunStatus,
    types::{EmployeeId, PayrollRunId, PayslipId, UserId},
};

#[derive(Debug, Clone, Default)]
pub struct PayrollRunFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<PayrollRunStatus>,
}

impl PayrollRunFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder).eq("status", self.status);
    }
}

pub struct PayrollRuns<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PayrollRuns<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Move a run from `from` to `to`, recording who did it.
    ///
    /// Returns `None` if the run's status is no longer `from`.
    #[instrument(skip(self, comment), err)]
    pub async fn transition(
        &mut self,
        id: PayrollRunId,
        from: PayrollRunStatus,
        to: PayrollRunStatus,
        actor: UserId,
        comment: Option<String>,
    ) -> Result<Option<PayrollRunDBResponse>> {
        let mut update = PartialUpdate::new("payroll_runs");
        update
            .set("status", Some(to))
            .set("status_changed_by", Some(actor))
            .set("status_changed_at", Some(Utc::now()))
            .set("status_comment", comment);
        update.execute_when(id, from, self.db).await
    }

    /// Pay inputs for every active employee holding a current salary, over the run's period.
    ///
    /// Bonuses count when awarded inside the period. Recurring deductions count when their
    /// validity overlaps the period, one-off deductions when they start inside it.
    #[instrument(skip(self, run), fields(run_id = run.id), err)]
    pub async fn payslip_inputs(&mut self, run: &PayrollRunDBResponse) -> Result<Vec<PayslipInputs>> {
        let inputs = sqlx::query_as::<_, PayslipInputs>(
            r#"
            SELECT
                e.id AS employee_id,
                s.base_salary,
                s.pay_frequency,
                COALESCE((
                    SELECT SUM(b.amount) FROM bonuses b
                    WHERE b.employee_id = e.id AND b.is_active AND b.award_date BETWEEN $1 AND $2
                ), 0) AS total_bonuses,
                COALESCE((
                    SELECT SUM(d.amount) FROM deductions d
                    WHERE d.employee_id = e.id AND d.is_active AND (
                        (d.is_recurring AND d.start_date <= $2 AND (d.end_date IS NULL OR d.end_date >= $1))
                        OR (NOT d.is_recurring AND d.start_date BETWEEN $1 AND $2)
                    )
                ), 0) AS total_deductions
            FROM employees e
            JOIN salaries s ON s.employee_id = e.id AND s.is_current
            WHERE e.is_active
            ORDER BY e.id
            "#,
        )
        .bind(run.period_start)
        .bind(run.period_end)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(inputs)
    }

    /// Insert one payslip per eligible employee, returning how many were written.
    ///
    /// Run totals are left alone; follow up with [`PayrollRuns::refresh_totals`].
    #[instrument(skip(self, run), fields(run_id = run.id), err)]
    pub async fn generate_payslips(&mut self, run: &PayrollRunDBResponse) -> Result<usize> {
        let inputs = self.payslip_inputs(run).await?;
        for input in &inputs {
            let payslip = input.compute(run.id);
            sqlx::query(
                r#"
                INSERT INTO payslips (payroll_run_id, employee_id, basic_pay, total_bonuses, total_deductions, gross_pay, net_pay)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(payslip.payroll_run_id)
            .bind(payslip.employee_id)
            .bind(payslip.basic_pay)
            .bind(payslip.total_bonuses)
            .bind(payslip.total_deductions)
            .bind(payslip.gross_pay)
            .bind(payslip.net_pay)
            .execute(&mut *self.db)
            .await?;
        }
        Ok(inputs.len())
    }

    #[instrument(skip(self), err)]
    pub async fn refresh_totals(&mut self, id: PayrollRunId) -> Result<PayrollRunDBResponse> {
        sqlx::query_as::<_, PayrollRunDBResponse>(
            r#"
            UPDATE payroll_runs r
            SET total_gross = t.gross, total_deductions = t.deductions, total_net = t.net, updated_at = NOW()
            FROM (
                SELECT COALESCE(SUM(gross_pay), 0) AS gross,
                       COALESCE(SUM(total_deductions), 0) AS deductions,
                       COALESCE(SUM(net_pay), 0) AS net
                FROM payslips WHERE payroll_run_id = $1
            ) t
            WHERE r.id = $1
            RETURNING r.*
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for PayrollRuns<'c> {
    type CreateRequest = PayrollRunCreateDBRequest;
    type UpdateRequest = PayrollRunUpdateDBRequest;
    type Response = PayrollRunDBResponse;
    type Id = PayrollRunId;
    type Filter = PayrollRunFilter;

    #[instrument(skip(self, request), fields(period_start = %request.period_start), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let run = sqlx::query_as::<_, PayrollRunDBResponse>(
            r#"
            INSERT INTO payroll_runs (period_start, period_end, pay_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.period_start)
        .bind(request.period_end)
        .bind(request.pay_date)
        .bind(&request.notes)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(run)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let run = sqlx::query_as::<_, PayrollRunDBResponse>("SELECT * FROM payroll_runs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(run)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM payroll_runs");
        filter.apply(&mut query);
        paginate(&mut query, "period_start DESC, id DESC", filter.skip, filter.limit);
        Ok(query.build_query_as::<PayrollRunDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM payroll_runs");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Hard delete, only while the run is still a draft
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payroll_runs WHERE id = $1 AND status = 'Draft'")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Edit a draft run. Fails with `NotFound` when no draft run has this id.
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("payroll_runs");
        update
            .set("period_start", request.period_start)
            .set("period_end", request.period_end)
            .set("pay_date", request.pay_date)
            .set_nullable("notes", request.notes.clone());
        update
            .execute_when(id, PayrollRunStatus::Draft, self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayslipFilter {
    pub skip: i64,
    pub limit: i64,
    pub run_id: Option<PayrollRunId>,
    pub employee_id: Option<EmployeeId>,
}

impl PayslipFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("payroll_run_id", self.run_id)
            .eq("employee_id", self.employee_id);
    }
}

/// Read access to generated payslips. Payslips are written only by run processing.
pub struct Payslips<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payslips<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: PayslipId) -> Result<Option<PayslipDBResponse>> {
        let payslip = sqlx::query_as::<_, PayslipDBResponse>("SELECT * FROM payslips WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(payslip)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &PayslipFilter) -> Result<Vec<PayslipDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM payslips");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<PayslipDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &PayslipFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM payslips");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        db::{
            handlers::{Bonuses, Deductions, Salaries},
            models::salaries::{BonusCreateDBRequest, DeductionCreateDBRequest, SalaryCreateDBRequest},
        },
        lifecycle::{Lifecycle, PayrollAction},
        test_utils::{create_test_department, create_test_employee, create_test_user},
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[sqlx::test]
    async fn test_process_generates_payslips_and_totals(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let department = create_test_department(&pool, "Finance").await;
        let paid = create_test_employee(&pool, "paid@hospital.local", department.id).await;
        // No current salary, so no payslip
        create_test_employee(&pool, "unpaid@hospital.local", department.id).await;

        let mut tx = pool.begin().await.unwrap();
        Salaries::new(&mut tx)
            .create(&SalaryCreateDBRequest {
                employee_id: paid.id,
                base_salary: Decimal::from(30_000),
                pay_frequency: None,
                effective_date: None,
                is_current: true,
            })
            .await
            .unwrap();
        Bonuses::new(&mut tx)
            .create(&BonusCreateDBRequest {
                employee_id: paid.id,
                bonus_type: "Night shift".to_string(),
                amount: Decimal::from(2_000),
                award_date: Some(date(1, 20)),
                description: None,
            })
            .await
            .unwrap();
        let mut deductions = Deductions::new(&mut tx);
        // Recurring and overlapping: counts
        deductions
            .create(&DeductionCreateDBRequest {
                employee_id: paid.id,
                deduction_type: "Pension".to_string(),
                amount: Decimal::from(1_000),
                is_recurring: true,
                start_date: Some(date(1, 1) - chrono::Days::new(90)),
                end_date: None,
            })
            .await
            .unwrap();
        // One-off outside the period: ignored
        deductions
            .create(&DeductionCreateDBRequest {
                employee_id: paid.id,
                deduction_type: "Uniform".to_string(),
                amount: Decimal::from(500),
                is_recurring: false,
                start_date: Some(date(2, 10)),
                end_date: None,
            })
            .await
            .unwrap();

        let mut runs = PayrollRuns::new(&mut tx);
        let run = runs
            .create(&PayrollRunCreateDBRequest {
                period_start: date(1, 1),
                period_end: date(1, 31),
                pay_date: date(2, 5),
                notes: None,
                created_by: officer.id,
            })
            .await
            .unwrap();
        let to = run.status.apply(PayrollAction::Process).unwrap();
        let processing = runs.transition(run.id, run.status, to, officer.id, None).await.unwrap().unwrap();
        assert_eq!(processing.status, PayrollRunStatus::Processing);
        assert_eq!(processing.status_changed_by, Some(officer.id));

        assert_eq!(runs.generate_payslips(&processing).await.unwrap(), 1);
        let totals = runs.refresh_totals(run.id).await.unwrap();
        assert_eq!(totals.total_gross, Decimal::from(32_000));
        assert_eq!(totals.total_deductions, Decimal::from(1_000));
        assert_eq!(totals.total_net, Decimal::from(31_000));

        // A stale transition from Draft no longer matches
        assert!(runs.transition(run.id, PayrollRunStatus::Draft, to, officer.id, None).await.unwrap().is_none());

        let mut payslips = Payslips::new(&mut tx);
        let filter = PayslipFilter {
            limit: 10,
            employee_id: Some(paid.id),
            ..Default::default()
        };
        let listed = payslips.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].net_pay, Decimal::from(31_000));
        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    async fn test_only_drafts_are_editable_or_deletable(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut runs = PayrollRuns::new(&mut conn);
        let run = runs
            .create(&PayrollRunCreateDBRequest {
                period_start: date(3, 1),
                period_end: date(3, 31),
                pay_date: date(4, 5),
                notes: Some("March".to_string()),
                created_by: officer.id,
            })
            .await
            .unwrap();

        let edited = runs
            .update(
                run.id,
                &PayrollRunUpdateDBRequest {
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.notes, None);

        runs.transition(run.id, PayrollRunStatus::Draft, PayrollRunStatus::Cancelled, officer.id, Some("dup".into()))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            runs.update(run.id, &PayrollRunUpdateDBRequest::default()).await.unwrap_err(),
            DbError::NotFound
        ));
        assert!(!runs.delete(run.id).await.unwrap());
        assert!(runs.get_by_id(run.id).await.unwrap().is_some());
    }
}
