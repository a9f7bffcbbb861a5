//! Database repository for employees.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    api::models::employees::EmploymentType,
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::employees::{EmployeeCreateDBRequest, EmployeeDBResponse, EmployeeUpdateDBRequest},
    },
    types::{BranchId, DepartmentId, EmployeeId, PositionId},
};

/// Filter for listing employees
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub skip: i64,
    pub limit: i64,
    pub department_id: Option<DepartmentId>,
    pub branch_id: Option<BranchId>,
    pub position_id: Option<PositionId>,
    pub employment_type: Option<EmploymentType>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl EmployeeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("department_id", self.department_id)
            .eq("branch_id", self.branch_id)
            .eq("position_id", self.position_id)
            .eq("employment_type", self.employment_type)
            .search(
                &["first_name", "last_name", "email", "employee_number"],
                self.search.as_deref(),
            )
            .active("is_active", self.include_inactive);
    }
}

pub struct Employees<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Employees<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether an employee row exists, active or not
    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, id: EmployeeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM employees WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Employees<'c> {
    type CreateRequest = EmployeeCreateDBRequest;
    type UpdateRequest = EmployeeUpdateDBRequest;
    type Response = EmployeeDBResponse;
    type Id = EmployeeId;
    type Filter = EmployeeFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Reserve the id first so a missing employee number can be derived from it
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval(pg_get_serial_sequence('employees', 'id'))")
            .fetch_one(&mut *self.db)
            .await?;

        let employee = sqlx::query_as::<_, EmployeeDBResponse>(
            r#"
            INSERT INTO employees (
                id, employee_number, first_name, last_name, email, phone, job_title,
                department_id, branch_id, position_id, manager_id, hire_date, employment_type
            )
            VALUES (
                $1, COALESCE($2, 'EMP-' || LPAD($1::text, 6, '0')), $3, $4, $5, $6, $7,
                $8, $9, $10, $11, COALESCE($12, CURRENT_DATE), COALESCE($13, 'full_time'::employment_type)
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.employee_number)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.job_title)
        .bind(request.department_id)
        .bind(request.branch_id)
        .bind(request.position_id)
        .bind(request.manager_id)
        .bind(request.hire_date)
        .bind(request.employment_type)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(employee)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let employee = sqlx::query_as::<_, EmployeeDBResponse>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(employee)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM employees");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);

        Ok(query.build_query_as::<EmployeeDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM employees");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "employees", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("employees");
        update
            .set("employee_number", request.employee_number.clone())
            .set("first_name", request.first_name.clone())
            .set("last_name", request.last_name.clone())
            .set("email", request.email.clone())
            .set_nullable("phone", request.phone.clone())
            .set("job_title", request.job_title.clone())
            .set("department_id", request.department_id)
            .set_nullable("branch_id", request.branch_id)
            .set_nullable("position_id", request.position_id)
            .set_nullable("manager_id", request.manager_id)
            .set("hire_date", request.hire_date)
            .set("employment_type", request.employment_type)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::test_utils::{create_test_department, employee_request};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_generates_employee_number(pool: PgPool) {
        let department = create_test_department(&pool, "Radiology").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Employees::new(&mut conn);

        let employee = repo.create(&employee_request("ana@hospital.local", department.id)).await.unwrap();
        assert_eq!(employee.employee_number, Some(format!("EMP-{:06}", employee.id)));
        assert_eq!(employee.employment_type, EmploymentType::FullTime);
        assert!(employee.is_active);
    }

    #[sqlx::test]
    async fn test_explicit_employee_number_is_kept(pool: PgPool) {
        let department = create_test_department(&pool, "Pharmacy").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Employees::new(&mut conn);

        let mut request = employee_request("ben@hospital.local", department.id);
        request.employee_number = Some("PH-7".to_string());
        let employee = repo.create(&request).await.unwrap();
        assert_eq!(employee.employee_number.as_deref(), Some("PH-7"));
    }

    #[sqlx::test]
    async fn test_unknown_department_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Employees::new(&mut conn);
        let err = repo.create(&employee_request("x@hospital.local", 4242)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    async fn test_search_and_department_filter(pool: PgPool) {
        let radiology = create_test_department(&pool, "Radiology").await;
        let pharmacy = create_test_department(&pool, "Pharmacy").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Employees::new(&mut conn);

        let mut ana = employee_request("ana@hospital.local", radiology.id);
        ana.first_name = "Ana".to_string();
        repo.create(&ana).await.unwrap();
        repo.create(&employee_request("ben@hospital.local", pharmacy.id)).await.unwrap();

        let by_department = EmployeeFilter {
            department_id: Some(pharmacy.id),
            ..EmployeeFilter::new(0, 10)
        };
        assert_eq!(repo.count(&by_department).await.unwrap(), 1);

        let by_search = EmployeeFilter {
            search: Some("ANA".to_string()),
            ..EmployeeFilter::new(0, 10)
        };
        let found = repo.list(&by_search).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Ana");
    }

    #[sqlx::test]
    async fn test_update_clears_nullable_reference(pool: PgPool) {
        let department = create_test_department(&pool, "Surgery").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Employees::new(&mut conn);

        let boss = repo.create(&employee_request("boss@hospital.local", department.id)).await.unwrap();
        let mut request = employee_request("staff@hospital.local", department.id);
        request.manager_id = Some(boss.id);
        let staff = repo.create(&request).await.unwrap();
        assert_eq!(staff.manager_id, Some(boss.id));

        let updated = repo
            .update(
                staff.id,
                &EmployeeUpdateDBRequest {
                    manager_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.manager_id, None);
        assert_eq!(updated.email, "staff@hospital.local");
    }
}
