//! Database repository for payroll deductions, including the HMO premium deductions kept in
//! step with enrollments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::salaries::{DeductionCreateDBRequest, DeductionDBResponse, DeductionUpdateDBRequest},
    },
    types::{DeductionId, EmployeeId, EnrollmentId},
};

/// Deduction type used for premiums synced from HMO enrollments
pub const HMO_PREMIUM_DEDUCTION: &str = "HMO Premium";

#[derive(Debug, Clone, Default)]
pub struct DeductionFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub deduction_type: Option<String>,
    pub include_inactive: bool,
}

impl DeductionFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("employee_id", self.employee_id)
            .eq("deduction_type", self.deduction_type.clone())
            .active("is_active", self.include_inactive);
    }
}

pub struct Deductions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Deductions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create or refresh the recurring premium deduction for an enrollment.
    ///
    /// Returns true when a new deduction was inserted, false when an existing one was updated.
    #[instrument(skip(self), err)]
    pub async fn upsert_premium(
        &mut self,
        enrollment_id: EnrollmentId,
        employee_id: EmployeeId,
        amount: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO deductions (employee_id, deduction_type, amount, is_recurring, start_date, hmo_enrollment_id)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            ON CONFLICT (hmo_enrollment_id) DO UPDATE
            SET amount = EXCLUDED.amount, is_active = TRUE, end_date = NULL, updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(employee_id)
        .bind(HMO_PREMIUM_DEDUCTION)
        .bind(amount)
        .bind(start_date)
        .bind(enrollment_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(inserted)
    }

    /// Stop the premium deduction of a terminated enrollment
    #[instrument(skip(self), err)]
    pub async fn end_for_enrollment(&mut self, enrollment_id: EnrollmentId, end_date: NaiveDate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE deductions
            SET is_active = FALSE, end_date = GREATEST(start_date, $2), updated_at = NOW()
            WHERE hmo_enrollment_id = $1 AND is_active
            "#,
        )
        .bind(enrollment_id)
        .bind(end_date)
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivate premium deductions whose enrollment is no longer active
    #[instrument(skip(self), err)]
    pub async fn deactivate_stale_premiums(&mut self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE deductions d
            SET is_active = FALSE, end_date = COALESCE(d.end_date, GREATEST(d.start_date, CURRENT_DATE)), updated_at = NOW()
            FROM hmo_enrollments e
            WHERE d.hmo_enrollment_id = e.id AND e.status <> 'Active' AND d.is_active
            "#,
        )
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Deductions<'c> {
    type CreateRequest = DeductionCreateDBRequest;
    type UpdateRequest = DeductionUpdateDBRequest;
    type Response = DeductionDBResponse;
    type Id = DeductionId;
    type Filter = DeductionFilter;

    #[instrument(skip(self, request), fields(employee_id = request.employee_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let deduction = sqlx::query_as::<_, DeductionDBResponse>(
            r#"
            INSERT INTO deductions (employee_id, deduction_type, amount, is_recurring, start_date, end_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.deduction_type)
        .bind(request.amount)
        .bind(request.is_recurring)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(deduction)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let deduction = sqlx::query_as::<_, DeductionDBResponse>("SELECT * FROM deductions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(deduction)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM deductions");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<DeductionDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM deductions");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "deductions", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("deductions");
        update
            .set("deduction_type", request.deduction_type.clone())
            .set("amount", request.amount)
            .set("is_recurring", request.is_recurring)
            .set("start_date", request.start_date)
            .set_nullable("end_date", request.end_date)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_department, create_test_employee};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_filter_by_type(pool: PgPool) {
        let department = create_test_department(&pool, "Billing").await;
        let employee = create_test_employee(&pool, "billing@hospital.local", department.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Deductions::new(&mut conn);

        for kind in ["Loan", "Tax", "Loan"] {
            repo.create(&DeductionCreateDBRequest {
                employee_id: employee.id,
                deduction_type: kind.to_string(),
                amount: Decimal::from(50),
                is_recurring: true,
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();
        }

        let loans = DeductionFilter {
            limit: 10,
            deduction_type: Some("Loan".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&loans).await.unwrap(), 2);
    }
}
