//! Database repository for salaries.
//!
//! An employee has at most one current salary. Making a salary current demotes the
//! previous one first, so callers run [`Salaries::create`] and [`Salaries::update`] inside a
//! transaction to keep the swap atomic.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, paginate},
        },
        models::salaries::{SalaryCreateDBRequest, SalaryDBResponse, SalaryUpdateDBRequest},
    },
    types::{EmployeeId, SalaryId},
};

#[derive(Debug, Clone, Default)]
pub struct SalaryFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub current_only: bool,
}

impl SalaryFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        // Salaries have no soft delete; retired rows are the non-current ones
        Conditions::new(builder)
            .eq("employee_id", self.employee_id)
            .active("is_current", !self.current_only);
    }
}

pub struct Salaries<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Salaries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn current_for_employee(&mut self, employee_id: EmployeeId) -> Result<Option<SalaryDBResponse>> {
        let salary = sqlx::query_as::<_, SalaryDBResponse>("SELECT * FROM salaries WHERE employee_id = $1 AND is_current")
            .bind(employee_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(salary)
    }

    /// Clear the current flag on the employee's salaries, except `keep`
    async fn demote_current(&mut self, employee_id: EmployeeId, keep: Option<SalaryId>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE salaries SET is_current = FALSE, updated_at = NOW() WHERE employee_id = $1 AND is_current AND id IS DISTINCT FROM $2",
        )
        .bind(employee_id)
        .bind(keep)
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Salaries<'c> {
    type CreateRequest = SalaryCreateDBRequest;
    type UpdateRequest = SalaryUpdateDBRequest;
    type Response = SalaryDBResponse;
    type Id = SalaryId;
    type Filter = SalaryFilter;

    #[instrument(skip(self, request), fields(employee_id = request.employee_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if request.is_current {
            self.demote_current(request.employee_id, None).await?;
        }

        let salary = sqlx::query_as::<_, SalaryDBResponse>(
            r#"
            INSERT INTO salaries (employee_id, base_salary, pay_frequency, effective_date, is_current)
            VALUES ($1, $2, COALESCE($3, 'monthly'::pay_frequency), COALESCE($4, CURRENT_DATE), $5)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(request.base_salary)
        .bind(request.pay_frequency)
        .bind(request.effective_date)
        .bind(request.is_current)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(salary)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let salary = sqlx::query_as::<_, SalaryDBResponse>("SELECT * FROM salaries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(salary)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM salaries");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<SalaryDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM salaries");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Retire the salary: it stays on record but is no longer current
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("UPDATE salaries SET is_current = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        if request.is_current == Some(true) {
            if let Some(existing) = self.get_by_id(id).await? {
                self.demote_current(existing.employee_id, Some(id)).await?;
            }
        }

        let mut update = PartialUpdate::new("salaries");
        update
            .set("base_salary", request.base_salary)
            .set("pay_frequency", request.pay_frequency)
            .set("effective_date", request.effective_date)
            .set("is_current", request.is_current);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::salaries::PayFrequency;
    use crate::test_utils::{create_test_department, create_test_employee};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn request(employee_id: EmployeeId, amount: i64) -> SalaryCreateDBRequest {
        SalaryCreateDBRequest {
            employee_id,
            base_salary: Decimal::from(amount),
            pay_frequency: None,
            effective_date: None,
            is_current: true,
        }
    }

    #[sqlx::test]
    async fn test_new_current_salary_supersedes_previous(pool: PgPool) {
        let department = create_test_department(&pool, "Laboratory").await;
        let employee = create_test_employee(&pool, "lab@hospital.local", department.id).await;
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Salaries::new(&mut tx);

        let first = repo.create(&request(employee.id, 30_000)).await.unwrap();
        assert_eq!(first.pay_frequency, PayFrequency::Monthly);
        let second = repo.create(&request(employee.id, 35_000)).await.unwrap();

        assert!(!repo.get_by_id(first.id).await.unwrap().unwrap().is_current);
        let current = repo.current_for_employee(employee.id).await.unwrap().unwrap();
        assert_eq!(current.id, second.id);

        let filter = SalaryFilter {
            limit: 10,
            employee_id: Some(employee.id),
            current_only: true,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        let history = SalaryFilter {
            current_only: false,
            ..filter
        };
        assert_eq!(repo.count(&history).await.unwrap(), 2);
        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    async fn test_promoting_old_salary_demotes_current(pool: PgPool) {
        let department = create_test_department(&pool, "Laboratory").await;
        let employee = create_test_employee(&pool, "lab@hospital.local", department.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Salaries::new(&mut conn);

        let first = repo.create(&request(employee.id, 30_000)).await.unwrap();
        let second = repo.create(&request(employee.id, 35_000)).await.unwrap();

        let promoted = repo
            .update(
                first.id,
                &SalaryUpdateDBRequest {
                    is_current: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_current);
        assert!(!repo.get_by_id(second.id).await.unwrap().unwrap().is_current);
    }
}
