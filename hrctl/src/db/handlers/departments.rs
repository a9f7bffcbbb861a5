//! Database repository for departments.

use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            branches::CatalogFilter,
            repository::Repository,
            sql::{PartialUpdate, deactivate, paginate},
        },
        models::departments::{DepartmentCreateDBRequest, DepartmentDBResponse, DepartmentUpdateDBRequest},
    },
    types::DepartmentId,
};

pub struct Departments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Departments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Departments<'c> {
    type CreateRequest = DepartmentCreateDBRequest;
    type UpdateRequest = DepartmentUpdateDBRequest;
    type Response = DepartmentDBResponse;
    type Id = DepartmentId;
    type Filter = CatalogFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let department = sqlx::query_as::<_, DepartmentDBResponse>(
            r#"
            INSERT INTO departments (name, description, manager_id, branch_id, budget)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.manager_id)
        .bind(request.branch_id)
        .bind(request.budget)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(department)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let department = sqlx::query_as::<_, DepartmentDBResponse>("SELECT * FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(department)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM departments");
        filter.apply(&mut query, &["name", "description"]);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<DepartmentDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM departments");
        filter.apply(&mut query, &["name", "description"]);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "departments", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("departments");
        update
            .set("name", request.name.clone())
            .set_nullable("description", request.description.clone())
            .set_nullable("manager_id", request.manager_id)
            .set_nullable("branch_id", request.branch_id)
            .set_nullable("budget", request.budget)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn request(name: &str) -> DepartmentCreateDBRequest {
        DepartmentCreateDBRequest {
            name: name.to_string(),
            description: None,
            manager_id: None,
            branch_id: None,
            budget: Some(Decimal::new(250_000_00, 2)),
        }
    }

    #[sqlx::test]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Departments::new(&mut conn);
        repo.create(&request("Cardiology")).await.unwrap();
        let err = repo.create(&request("Cardiology")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn test_budget_round_trips_and_clears(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Departments::new(&mut conn);
        let created = repo.create(&request("Oncology")).await.unwrap();
        assert_eq!(created.budget, Some(Decimal::new(250_000_00, 2)));

        let updated = repo
            .update(
                created.id,
                &DepartmentUpdateDBRequest {
                    budget: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.budget, None);
        assert_eq!(updated.name, "Oncology");
    }
}
