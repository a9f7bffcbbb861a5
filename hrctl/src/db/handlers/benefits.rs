//! Database repositories for benefit categories, benefits and their assignments.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{
            branches::CatalogFilter,
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::benefits::{
            BenefitAssignmentCreateDBRequest, BenefitAssignmentDBResponse, BenefitCategoryCreateDBRequest,
            BenefitCategoryDBResponse, BenefitCategoryUpdateDBRequest, BenefitCreateDBRequest, BenefitDBResponse,
            BenefitUpdateDBRequest, EmployeeBenefitDBResponse,
        },
    },
    types::{BenefitAssignmentId, BenefitCategoryId, BenefitId, EmployeeId},
};

pub struct BenefitCategories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BenefitCategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for BenefitCategories<'c> {
    type CreateRequest = BenefitCategoryCreateDBRequest;
    type UpdateRequest = BenefitCategoryUpdateDBRequest;
    type Response = BenefitCategoryDBResponse;
    type Id = BenefitCategoryId;
    type Filter = CatalogFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, BenefitCategoryDBResponse>(
            "INSERT INTO benefit_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, BenefitCategoryDBResponse>("SELECT * FROM benefit_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(category)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM benefit_categories");
        filter.apply(&mut query, &["name"]);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<BenefitCategoryDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM benefit_categories");
        filter.apply(&mut query, &["name"]);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "benefit_categories", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("benefit_categories");
        update
            .set("name", request.name.clone())
            .set_nullable("description", request.description.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct BenefitFilter {
    pub skip: i64,
    pub limit: i64,
    pub category_id: Option<BenefitCategoryId>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl BenefitFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("category_id", self.category_id)
            .search(&["name", "description"], self.search.as_deref())
            .active("is_active", self.include_inactive);
    }
}

pub struct Benefits<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Benefits<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Benefits<'c> {
    type CreateRequest = BenefitCreateDBRequest;
    type UpdateRequest = BenefitUpdateDBRequest;
    type Response = BenefitDBResponse;
    type Id = BenefitId;
    type Filter = BenefitFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let benefit = sqlx::query_as::<_, BenefitDBResponse>(
            "INSERT INTO benefits (category_id, name, description, value) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.value)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(benefit)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let benefit = sqlx::query_as::<_, BenefitDBResponse>("SELECT * FROM benefits WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(benefit)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM benefits");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<BenefitDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM benefits");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "benefits", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("benefits");
        update
            .set("category_id", request.category_id)
            .set("name", request.name.clone())
            .set_nullable("description", request.description.clone())
            .set_nullable("value", request.value)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

/// Benefit assignments. Not a [`Repository`]: assignments are only ever created and ended.
pub struct BenefitAssignments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BenefitAssignments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(employee_id = request.employee_id, benefit_id = request.benefit_id), err)]
    pub async fn assign(&mut self, request: &BenefitAssignmentCreateDBRequest) -> Result<BenefitAssignmentDBResponse> {
        let assignment = sqlx::query_as::<_, BenefitAssignmentDBResponse>(
            r#"
            INSERT INTO employee_benefits (employee_id, benefit_id, start_date)
            VALUES ($1, $2, COALESCE($3, CURRENT_DATE))
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(request.benefit_id)
        .bind(request.start_date)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(assignment)
    }

    /// End an active assignment today. Fails with `NotFound` when no active assignment matches.
    #[instrument(skip(self), err)]
    pub async fn end(&mut self, id: BenefitAssignmentId) -> Result<BenefitAssignmentDBResponse> {
        sqlx::query_as::<_, BenefitAssignmentDBResponse>(
            r#"
            UPDATE employee_benefits
            SET end_date = GREATEST(start_date, CURRENT_DATE), is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn list_for_employee(&mut self, employee_id: EmployeeId, include_inactive: bool) -> Result<Vec<EmployeeBenefitDBResponse>> {
        let rows = sqlx::query_as::<_, EmployeeBenefitDBResponse>(
            r#"
            SELECT eb.id AS assignment_id, b.id AS benefit_id, b.name AS benefit_name,
                   c.name AS category_name, b.value, eb.start_date, eb.end_date, eb.is_active
            FROM employee_benefits eb
            JOIN benefits b ON b.id = eb.benefit_id
            JOIN benefit_categories c ON c.id = b.category_id
            WHERE eb.employee_id = $1 AND (eb.is_active OR $2)
            ORDER BY eb.start_date DESC, eb.id DESC
            "#,
        )
        .bind(employee_id)
        .bind(include_inactive)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }
}
