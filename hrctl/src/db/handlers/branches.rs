//! Database repository for hospital branches.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::branches::{BranchCreateDBRequest, BranchDBResponse, BranchUpdateDBRequest},
    },
    types::BranchId,
};

/// Name search and soft-delete visibility, shared by the simple catalog tables
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl CatalogFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub(crate) fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>, search_columns: &[&str]) {
        Conditions::new(builder)
            .search(search_columns, self.search.as_deref())
            .active("is_active", self.include_inactive);
    }
}

pub struct Branches<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Branches<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Branches<'c> {
    type CreateRequest = BranchCreateDBRequest;
    type UpdateRequest = BranchUpdateDBRequest;
    type Response = BranchDBResponse;
    type Id = BranchId;
    type Filter = CatalogFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let branch = sqlx::query_as::<_, BranchDBResponse>(
            "INSERT INTO branches (name, address, phone) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(branch)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let branch = sqlx::query_as::<_, BranchDBResponse>("SELECT * FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(branch)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM branches");
        filter.apply(&mut query, &["name", "address"]);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<BranchDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM branches");
        filter.apply(&mut query, &["name", "address"]);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "branches", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("branches");
        update
            .set("name", request.name.clone())
            .set_nullable("address", request.address.clone())
            .set_nullable("phone", request.phone.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_soft_delete_hides_from_default_list(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Branches::new(&mut conn);

        let north = repo
            .create(&BranchCreateDBRequest {
                name: "North".to_string(),
                address: None,
                phone: None,
            })
            .await
            .unwrap();
        repo.create(&BranchCreateDBRequest {
            name: "South".to_string(),
            address: Some("12 Harbor Rd".to_string()),
            phone: None,
        })
        .await
        .unwrap();

        assert!(repo.delete(north.id).await.unwrap());
        assert!(!repo.delete(999_999).await.unwrap());

        let filter = CatalogFilter::new(0, 10);
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "South");

        let all = CatalogFilter {
            include_inactive: true,
            ..filter
        };
        assert_eq!(repo.count(&all).await.unwrap(), 2);
        assert!(!repo.get_by_id(north.id).await.unwrap().unwrap().is_active);
    }

    #[sqlx::test]
    async fn test_search_matches_address(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Branches::new(&mut conn);
        repo.create(&BranchCreateDBRequest {
            name: "Annex".to_string(),
            address: Some("5 Harbor Rd".to_string()),
            phone: None,
        })
        .await
        .unwrap();

        let filter = CatalogFilter {
            search: Some("harbor".to_string()),
            ..CatalogFilter::new(0, 10)
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }
}
