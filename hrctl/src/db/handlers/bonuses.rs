//! Database repository for bonuses.

use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{
            repository::Repository,
            sql::{Conditions, PartialUpdate, deactivate, paginate},
        },
        models::salaries::{BonusCreateDBRequest, BonusDBResponse, BonusUpdateDBRequest},
    },
    types::{BonusId, EmployeeId},
};

#[derive(Debug, Clone, Default)]
pub struct BonusFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_inactive: bool,
}

impl BonusFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("employee_id", self.employee_id)
            .cmp("award_date", ">=", self.from)
            .cmp("award_date", "<=", self.to)
            .active("is_active", self.include_inactive);
    }
}

pub struct Bonuses<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bonuses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Bonuses<'c> {
    type CreateRequest = BonusCreateDBRequest;
    type UpdateRequest = BonusUpdateDBRequest;
    type Response = BonusDBResponse;
    type Id = BonusId;
    type Filter = BonusFilter;

    #[instrument(skip(self, request), fields(employee_id = request.employee_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let bonus = sqlx::query_as::<_, BonusDBResponse>(
            r#"
            INSERT INTO bonuses (employee_id, bonus_type, amount, award_date, description)
            VALUES ($1, $2, $3, COALESCE($4, CURRENT_DATE), $5)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.bonus_type)
        .bind(request.amount)
        .bind(request.award_date)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(bonus)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let bonus = sqlx::query_as::<_, BonusDBResponse>("SELECT * FROM bonuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(bonus)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM bonuses");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<BonusDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM bonuses");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "bonuses", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("bonuses");
        update
            .set("bonus_type", request.bonus_type.clone())
            .set("amount", request.amount)
            .set("award_date", request.award_date)
            .set_nullable("description", request.description.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_department, create_test_employee};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_award_date_range(pool: PgPool) {
        let department = create_test_department(&pool, "Emergency").await;
        let employee = create_test_employee(&pool, "er@hospital.local", department.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bonuses::new(&mut conn);

        for (month, amount) in [(1, 100), (2, 200), (3, 300)] {
            repo.create(&BonusCreateDBRequest {
                employee_id: employee.id,
                bonus_type: "Performance".to_string(),
                amount: Decimal::from(amount),
                award_date: NaiveDate::from_ymd_opt(2025, month, 15),
                description: None,
            })
            .await
            .unwrap();
        }

        let filter = BonusFilter {
            limit: 10,
            from: NaiveDate::from_ymd_opt(2025, 2, 1),
            to: NaiveDate::from_ymd_opt(2025, 2, 28),
            ..Default::default()
        };
        let bonuses = repo.list(&filter).await.unwrap();
        assert_eq!(bonuses.len(), 1);
        assert_eq!(bonuses[0].amount, Decimal::from(200));
    }
}
