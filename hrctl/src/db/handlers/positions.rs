//! Database repository for job positions.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::positions::{PositionCreateDBRequest, PositionDBResponse, PositionUpdateDBRequest},
    },
    types::{DepartmentId, PositionId},
};

#[derive(Debug, Clone, Default)]
pub struct PositionFilter {
    pub skip: i64,
    pub limit: i64,
    pub department_id: Option<DepartmentId>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl PositionFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("department_id", self.department_id)
            .search(&["title"], self.search.as_deref())
            .active("is_active", self.include_inactive);
    }
}

pub struct Positions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Positions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Positions<'c> {
    type CreateRequest = PositionCreateDBRequest;
    type UpdateRequest = PositionUpdateDBRequest;
    type Response = PositionDBResponse;
    type Id = PositionId;
    type Filter = PositionFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let position = sqlx::query_as::<_, PositionDBResponse>(
            "INSERT INTO positions (title, department_id, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.title)
        .bind(request.department_id)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(position)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let position = sqlx::query_as::<_, PositionDBResponse>("SELECT * FROM positions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(position)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM positions");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<PositionDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM positions");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "positions", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("positions");
        update
            .set("title", request.title.clone())
            .set_nullable("department_id", request.department_id)
            .set_nullable("description", request.description.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}
