//! Database repositories for compensation planning.
//!
//! Salary grades and pay bands are plain catalog tables. Grade mappings keep at most one
//! current row per employee. Pay adjustments and grade revisions are approval requests whose
//! status moves exactly once, out of `Pending`.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            branches::CatalogFilter,
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::compensation::{
            GradeMappingCreateDBRequest, GradeMappingDBResponse, GradeRevisionCreateDBRequest, GradeRevisionDBResponse,
            PayAdjustmentCreateDBRequest, PayAdjustmentDBResponse, PayBandCreateDBRequest, PayBandDBResponse,
            PayBandUpdateDBRequest, SalaryGradeCreateDBRequest, SalaryGradeDBResponse, SalaryGradeUpdateDBRequest,
        },
    },
    lifecycle::ApprovalStatus,
    types::{EmployeeId, GradeMappingId, GradeRevisionId, PayAdjustmentId, PayBandId, SalaryGradeId, UserId},
};

const GRADE_SEARCH: &[&str] = &["code", "name"];

pub struct SalaryGrades<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SalaryGrades<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for SalaryGrades<'c> {
    type CreateRequest = SalaryGradeCreateDBRequest;
    type UpdateRequest = SalaryGradeUpdateDBRequest;
    type Response = SalaryGradeDBResponse;
    type Id = SalaryGradeId;
    type Filter = CatalogFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let grade = sqlx::query_as::<_, SalaryGradeDBResponse>(
            "INSERT INTO salary_grades (code, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(grade)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let grade = sqlx::query_as::<_, SalaryGradeDBResponse>("SELECT * FROM salary_grades WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(grade)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM salary_grades");
        filter.apply(&mut query, GRADE_SEARCH);
        paginate(&mut query, "code ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<SalaryGradeDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM salary_grades");
        filter.apply(&mut query, GRADE_SEARCH);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "salary_grades", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("salary_grades");
        update
            .set("code", request.code.clone())
            .set("name", request.name.clone())
            .set_nullable("description", request.description.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayBandFilter {
    pub skip: i64,
    pub limit: i64,
    pub grade_id: Option<SalaryGradeId>,
    pub include_inactive: bool,
}

impl PayBandFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("grade_id", self.grade_id)
            .active("is_active", self.include_inactive);
    }
}

pub struct PayBands<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PayBands<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Retire every active band of the grade and install a new one from today.
    ///
    /// Run inside a transaction together with the revision status change.
    #[instrument(skip(self), err)]
    pub async fn replace_for_grade(
        &mut self,
        grade_id: SalaryGradeId,
        min_salary: Decimal,
        mid_salary: Decimal,
        max_salary: Decimal,
    ) -> Result<PayBandDBResponse> {
        sqlx::query("UPDATE pay_bands SET is_active = FALSE, updated_at = NOW() WHERE grade_id = $1 AND is_active")
            .bind(grade_id)
            .execute(&mut *self.db)
            .await?;

        self.create(&PayBandCreateDBRequest {
            grade_id,
            min_salary,
            mid_salary,
            max_salary,
            effective_date: None,
        })
        .await
    }
}

#[async_trait::async_trait]
impl<'c> Repository for PayBands<'c> {
    type CreateRequest = PayBandCreateDBRequest;
    type UpdateRequest = PayBandUpdateDBRequest;
    type Response = PayBandDBResponse;
    type Id = PayBandId;
    type Filter = PayBandFilter;

    #[instrument(skip(self, request), fields(grade_id = request.grade_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let band = sqlx::query_as::<_, PayBandDBResponse>(
            r#"
            INSERT INTO pay_bands (grade_id, min_salary, mid_salary, max_salary, effective_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE))
            RETURNING *
            "#,
        )
        .bind(request.grade_id)
        .bind(request.min_salary)
        .bind(request.mid_salary)
        .bind(request.max_salary)
        .bind(request.effective_date)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(band)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let band = sqlx::query_as::<_, PayBandDBResponse>("SELECT * FROM pay_bands WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(band)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM pay_bands");
        filter.apply(&mut query);
        paginate(&mut query, "grade_id ASC, effective_date DESC, id DESC", filter.skip, filter.limit);
        Ok(query.build_query_as::<PayBandDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM pay_bands");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "pay_bands", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("pay_bands");
        update
            .set("min_salary", request.min_salary)
            .set("mid_salary", request.mid_salary)
            .set("max_salary", request.max_salary)
            .set("effective_date", request.effective_date)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct GradeMappingFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub grade_id: Option<SalaryGradeId>,
    pub current_only: bool,
}

impl GradeMappingFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("employee_id", self.employee_id)
            .eq("grade_id", self.grade_id)
            .active("is_current", !self.current_only);
    }
}

/// Employee to grade assignments
pub struct GradeMappings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GradeMappings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a mapping. A current mapping replaces the employee's previous current one.
    #[instrument(skip(self, request), fields(employee_id = request.employee_id, grade_id = request.grade_id), err)]
    pub async fn create(&mut self, request: &GradeMappingCreateDBRequest) -> Result<GradeMappingDBResponse> {
        if request.is_current {
            sqlx::query(
                "UPDATE employee_grade_mappings SET is_current = FALSE, updated_at = NOW() WHERE employee_id = $1 AND is_current",
            )
            .bind(request.employee_id)
            .execute(&mut *self.db)
            .await?;
        }

        let mapping = sqlx::query_as::<_, GradeMappingDBResponse>(
            r#"
            INSERT INTO employee_grade_mappings (employee_id, grade_id, step, effective_date, is_current)
            VALUES ($1, $2, COALESCE($3, 1), COALESCE($4, CURRENT_DATE), $5)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(request.grade_id)
        .bind(request.step)
        .bind(request.effective_date)
        .bind(request.is_current)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(mapping)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: GradeMappingId) -> Result<Option<GradeMappingDBResponse>> {
        let mapping = sqlx::query_as::<_, GradeMappingDBResponse>("SELECT * FROM employee_grade_mappings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(mapping)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &GradeMappingFilter) -> Result<Vec<GradeMappingDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM employee_grade_mappings");
        filter.apply(&mut query);
        paginate(&mut query, "effective_date DESC, id DESC", filter.skip, filter.limit);
        Ok(query.build_query_as::<GradeMappingDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &GradeMappingFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM employee_grade_mappings");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Mappings are history rows without a soft delete; removing one is permanent
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: GradeMappingId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employee_grade_mappings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub grade_id: Option<SalaryGradeId>,
    pub status: Option<ApprovalStatus>,
}

pub struct PayAdjustments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PayAdjustments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    fn apply(filter: &ApprovalFilter, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("employee_id", filter.employee_id)
            .eq("status", filter.status);
    }

    /// File a request. The employee's current base salary is captured alongside it.
    #[instrument(skip(self, request), fields(employee_id = request.employee_id), err)]
    pub async fn create(&mut self, request: &PayAdjustmentCreateDBRequest) -> Result<PayAdjustmentDBResponse> {
        let adjustment = sqlx::query_as::<_, PayAdjustmentDBResponse>(
            r#"
            INSERT INTO pay_adjustments (
                employee_id, current_salary, proposed_salary, adjustment_type, reason, effective_date, requested_by
            )
            VALUES (
                $1, (SELECT base_salary FROM salaries WHERE employee_id = $1 AND is_current),
                $2, $3, $4, COALESCE($5, CURRENT_DATE), $6
            )
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(request.proposed_salary)
        .bind(&request.adjustment_type)
        .bind(&request.reason)
        .bind(request.effective_date)
        .bind(request.requested_by)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(adjustment)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: PayAdjustmentId) -> Result<Option<PayAdjustmentDBResponse>> {
        let adjustment = sqlx::query_as::<_, PayAdjustmentDBResponse>("SELECT * FROM pay_adjustments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(adjustment)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ApprovalFilter) -> Result<Vec<PayAdjustmentDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM pay_adjustments");
        Self::apply(filter, &mut query);
        paginate(&mut query, "created_at DESC, id DESC", filter.skip, filter.limit);
        Ok(query.build_query_as::<PayAdjustmentDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ApprovalFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM pay_adjustments");
        Self::apply(filter, &mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Decide a pending request. `None` if it was decided in the meantime.
    #[instrument(skip(self, comment), err)]
    pub async fn transition(
        &mut self,
        id: PayAdjustmentId,
        from: ApprovalStatus,
        to: ApprovalStatus,
        actor: UserId,
        comment: Option<String>,
    ) -> Result<Option<PayAdjustmentDBResponse>> {
        let mut update = PartialUpdate::new("pay_adjustments");
        update
            .set("status", Some(to))
            .set("status_changed_by", Some(actor))
            .set("status_changed_at", Some(Utc::now()))
            .set("status_comment", comment);
        update.execute_when(id, from, self.db).await
    }
}

pub struct GradeRevisions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GradeRevisions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    fn apply(filter: &ApprovalFilter, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("grade_id", filter.grade_id)
            .eq("status", filter.status);
    }

    #[instrument(skip(self, request), fields(grade_id = request.grade_id), err)]
    pub async fn create(&mut self, request: &GradeRevisionCreateDBRequest) -> Result<GradeRevisionDBResponse> {
        let revision = sqlx::query_as::<_, GradeRevisionDBResponse>(
            r#"
            INSERT INTO grade_revisions (
                grade_id, proposed_min_salary, proposed_mid_salary, proposed_max_salary, reason, requested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.grade_id)
        .bind(request.proposed_min_salary)
        .bind(request.proposed_mid_salary)
        .bind(request.proposed_max_salary)
        .bind(&request.reason)
        .bind(request.requested_by)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(revision)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: GradeRevisionId) -> Result<Option<GradeRevisionDBResponse>> {
        let revision = sqlx::query_as::<_, GradeRevisionDBResponse>("SELECT * FROM grade_revisions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(revision)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ApprovalFilter) -> Result<Vec<GradeRevisionDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM grade_revisions");
        Self::apply(filter, &mut query);
        paginate(&mut query, "created_at DESC, id DESC", filter.skip, filter.limit);
        Ok(query.build_query_as::<GradeRevisionDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ApprovalFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM grade_revisions");
        Self::apply(filter, &mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self, comment), err)]
    pub async fn transition(
        &mut self,
        id: GradeRevisionId,
        from: ApprovalStatus,
        to: ApprovalStatus,
        actor: UserId,
        comment: Option<String>,
    ) -> Result<Option<GradeRevisionDBResponse>> {
        let mut update = PartialUpdate::new("grade_revisions");
        update
            .set("status", Some(to))
            .set("status_changed_by", Some(actor))
            .set("status_changed_at", Some(Utc::now()))
            .set("status_comment", comment);
        update.execute_when(id, from, self.db).await
    }
}
