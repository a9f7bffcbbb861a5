//! Database repositories for the HMO catalog, enrollments and claims.

use chrono::{NaiveDate, Utc};
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
        models::hmo::{
            ClaimCreateDBRequest, ClaimDBResponse, EnrollmentCreateDBRequest, EnrollmentDBResponse, HmoPlanCreateDBRequest,
            HmoPlanDBResponse, HmoPlanUpdateDBRequest, HmoProviderCreateDBRequest, HmoProviderDBResponse,
            HmoProviderUpdateDBRequest, PremiumDeduction,
        },
    },
    lifecycle::{ClaimStatus, EnrollmentStatus},
    types::{ClaimId, EmployeeId, EnrollmentId, HmoPlanId, HmoProviderId, UserId},
};

pub struct HmoProviders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> HmoProviders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for HmoProviders<'c> {
    type CreateRequest = HmoProviderCreateDBRequest;
    type UpdateRequest = HmoProviderUpdateDBRequest;
    type Response = HmoProviderDBResponse;
    type Id = HmoProviderId;
    type Filter = CatalogFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let provider = sqlx::query_as::<_, HmoProviderDBResponse>(
            "INSERT INTO hmo_providers (name, contact_person, email, phone) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.contact_person)
        .bind(&request.email)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(provider)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let provider = sqlx::query_as::<_, HmoProviderDBResponse>("SELECT * FROM hmo_providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(provider)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM hmo_providers");
        filter.apply(&mut query, &["name", "contact_person"]);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<HmoProviderDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM hmo_providers");
        filter.apply(&mut query, &["name", "contact_person"]);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "hmo_providers", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("hmo_providers");
        update
            .set("name", request.name.clone())
            .set_nullable("contact_person", request.contact_person.clone())
            .set_nullable("email", request.email.clone())
            .set_nullable("phone", request.phone.clone())
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct HmoPlanFilter {
    pub skip: i64,
    pub limit: i64,
    pub provider_id: Option<HmoProviderId>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl HmoPlanFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("provider_id", self.provider_id)
            .search(&["name", "coverage"], self.search.as_deref())
            .active("is_active", self.include_inactive);
    }
}

pub struct HmoPlans<'c> {
    db: &'c mut PgConnection,
}

impl<'c> HmoPlans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for HmoPlans<'c> {
    type CreateRequest = HmoPlanCreateDBRequest;
    type UpdateRequest = HmoPlanUpdateDBRequest;
    type Response = HmoPlanDBResponse;
    type Id = HmoPlanId;
    type Filter = HmoPlanFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let plan = sqlx::query_as::<_, HmoPlanDBResponse>(
            r#"
            INSERT INTO hmo_plans (provider_id, name, coverage, monthly_premium, employee_share, max_benefit_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.provider_id)
        .bind(&request.name)
        .bind(&request.coverage)
        .bind(request.monthly_premium)
        .bind(request.employee_share)
        .bind(request.max_benefit_limit)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(plan)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let plan = sqlx::query_as::<_, HmoPlanDBResponse>("SELECT * FROM hmo_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(plan)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM hmo_plans");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<HmoPlanDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM hmo_plans");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        deactivate(self.db, "hmo_plans", id).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut update = PartialUpdate::new("hmo_plans");
        update
            .set("provider_id", request.provider_id)
            .set("name", request.name.clone())
            .set_nullable("coverage", request.coverage.clone())
            .set("monthly_premium", request.monthly_premium)
            .set("employee_share", request.employee_share)
            .set_nullable("max_benefit_limit", request.max_benefit_limit)
            .set("is_active", request.is_active);
        update.execute(id, self.db).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub skip: i64,
    pub limit: i64,
    pub employee_id: Option<EmployeeId>,
    pub plan_id: Option<HmoPlanId>,
    pub status: Option<EnrollmentStatus>,
}

impl EnrollmentFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("employee_id", self.employee_id)
            .eq("plan_id", self.plan_id)
            .eq("status", self.status);
    }
}

/// HMO enrollments. Created, read and terminated; never edited in place.
pub struct Enrollments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Enrollments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(employee_id = request.employee_id, plan_id = request.plan_id), err)]
    pub async fn create(&mut self, request: &EnrollmentCreateDBRequest) -> Result<EnrollmentDBResponse> {
        let enrollment = sqlx::query_as::<_, EnrollmentDBResponse>(
            r#"
            INSERT INTO hmo_enrollments (employee_id, plan_id, start_date)
            VALUES ($1, $2, COALESCE($3, CURRENT_DATE))
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(request.plan_id)
        .bind(request.start_date)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(enrollment)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: EnrollmentId) -> Result<Option<EnrollmentDBResponse>> {
        let enrollment = sqlx::query_as::<_, EnrollmentDBResponse>("SELECT * FROM hmo_enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(enrollment)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &EnrollmentFilter) -> Result<Vec<EnrollmentDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM hmo_enrollments");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<EnrollmentDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &EnrollmentFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM hmo_enrollments");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Terminate an active enrollment. `None` when it was no longer active.
    #[instrument(skip(self, reason), err)]
    pub async fn terminate(
        &mut self,
        id: EnrollmentId,
        end_date: NaiveDate,
        actor: UserId,
        reason: Option<String>,
    ) -> Result<Option<EnrollmentDBResponse>> {
        let mut update = PartialUpdate::new("hmo_enrollments");
        update
            .set("status", Some(EnrollmentStatus::Terminated))
            .set("end_date", Some(end_date))
            .set("status_changed_by", Some(actor))
            .set("status_changed_at", Some(Utc::now()))
            .set("status_comment", reason);
        update.execute_when(id, EnrollmentStatus::Active, self.db).await
    }

    /// Premium each active enrollment contributes to payroll
    #[instrument(skip(self), err)]
    pub async fn premium_deductions(&mut self) -> Result<Vec<PremiumDeduction>> {
        let rows = sqlx::query_as::<_, PremiumDeduction>(
            r#"
            SELECT en.id AS enrollment_id, e.id AS employee_id,
                   e.first_name || ' ' || e.last_name AS employee_name,
                   p.id AS plan_id, p.name AS plan_name, p.monthly_premium, p.employee_share, en.start_date
            FROM hmo_enrollments en
            JOIN employees e ON e.id = en.employee_id
            JOIN hmo_plans p ON p.id = en.plan_id
            WHERE en.status = 'Active'
            ORDER BY en.id
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub skip: i64,
    pub limit: i64,
    pub enrollment_id: Option<EnrollmentId>,
    pub employee_id: Option<EmployeeId>,
    pub status: Option<ClaimStatus>,
}

impl ClaimFilter {
    fn apply(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        Conditions::new(builder)
            .eq("enrollment_id", self.enrollment_id)
            .eq("status", self.status)
            .raw(
                " AND enrollment_id IN (SELECT id FROM hmo_enrollments WHERE employee_id = ",
                self.employee_id,
                ")",
            );
    }
}

pub struct Claims<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Claims<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// File a claim. The claim number is derived from the filing date and the claim id.
    #[instrument(skip(self, request), fields(enrollment_id = request.enrollment_id), err)]
    pub async fn create(&mut self, request: &ClaimCreateDBRequest) -> Result<ClaimDBResponse> {
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval(pg_get_serial_sequence('hmo_claims', 'id'))")
            .fetch_one(&mut *self.db)
            .await?;

        let claim = sqlx::query_as::<_, ClaimDBResponse>(
            r#"
            INSERT INTO hmo_claims (id, claim_number, enrollment_id, amount, service_date, description)
            VALUES ($1, 'CLM-' || TO_CHAR(NOW(), 'YYYYMMDD') || '-' || LPAD($1::text, 6, '0'), $2, $3, COALESCE($4, CURRENT_DATE), $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.enrollment_id)
        .bind(request.amount)
        .bind(request.service_date)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(claim)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ClaimId) -> Result<Option<ClaimDBResponse>> {
        let claim = sqlx::query_as::<_, ClaimDBResponse>("SELECT * FROM hmo_claims WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(claim)
    }

    /// Employee who holds the claim's enrollment
    #[instrument(skip(self), err)]
    pub async fn owner(&mut self, id: ClaimId) -> Result<Option<EmployeeId>> {
        let owner = sqlx::query_scalar::<_, EmployeeId>(
            "SELECT en.employee_id FROM hmo_claims c JOIN hmo_enrollments en ON en.id = c.enrollment_id WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(owner)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ClaimFilter) -> Result<Vec<ClaimDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM hmo_claims");
        filter.apply(&mut query);
        paginate(&mut query, "id ASC", filter.skip, filter.limit);
        Ok(query.build_query_as::<ClaimDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ClaimFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM hmo_claims");
        filter.apply(&mut query);
        Ok(query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?)
    }

    /// Move a claim from `from` to `to`. `None` if its status changed in the meantime.
    #[instrument(skip(self, comment), err)]
    pub async fn transition(
        &mut self,
        id: ClaimId,
        from: ClaimStatus,
        to: ClaimStatus,
        actor: UserId,
        comment: Option<String>,
    ) -> Result<Option<ClaimDBResponse>> {
        let mut update = PartialUpdate::new("hmo_claims");
        update
            .set("status", Some(to))
            .set("status_changed_by", Some(actor))
            .set("status_changed_at", Some(Utc::now()))
            .set("status_comment", comment);
        update.execute_when(id, from, self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        db::errors::DbError,
        test_utils::{create_test_department, create_test_employee, create_test_user},
    };
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn seed_plan(conn: &mut PgConnection) -> HmoPlanDBResponse {
        let provider = HmoProviders::new(&mut *conn)
            .create(&HmoProviderCreateDBRequest {
                name: "MediCare Plus".to_string(),
                contact_person: None,
                email: None,
                phone: None,
            })
            .await
            .unwrap();
        HmoPlans::new(&mut *conn)
            .create(&HmoPlanCreateDBRequest {
                provider_id: provider.id,
                name: "Gold".to_string(),
                coverage: Some("Inpatient and outpatient".to_string()),
                monthly_premium: Decimal::from(2_000),
                employee_share: Decimal::from(500),
                max_benefit_limit: Some(Decimal::from(150_000)),
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_enrollment_terminates_once(pool: PgPool) {
        let admin = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Radiology").await;
        let employee = create_test_employee(&pool, "xray@hospital.local", department.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let plan = seed_plan(&mut conn).await;
        let mut enrollments = Enrollments::new(&mut conn);

        let request = EnrollmentCreateDBRequest {
            employee_id: employee.id,
            plan_id: plan.id,
            start_date: None,
        };
        let enrollment = enrollments.create(&request).await.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert!(matches!(
            enrollments.create(&request).await.unwrap_err(),
            DbError::UniqueViolation { .. }
        ));
        assert_eq!(enrollments.premium_deductions().await.unwrap().len(), 1);

        let first_end = NaiveDate::from_ymd_opt(2030, 1, 31).unwrap();
        let terminated = enrollments
            .terminate(enrollment.id, first_end, admin.id, Some("left".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(terminated.status, EnrollmentStatus::Terminated);
        assert_eq!(terminated.end_date, Some(first_end));

        let second_end = NaiveDate::from_ymd_opt(2030, 2, 28).unwrap();
        assert!(enrollments.terminate(enrollment.id, second_end, admin.id, None).await.unwrap().is_none());
        let reloaded = enrollments.get_by_id(enrollment.id).await.unwrap().unwrap();
        assert_eq!(reloaded.end_date, Some(first_end));

        // A fresh enrollment in the same plan is allowed once the old one ended
        enrollments.create(&request).await.unwrap();
    }

    #[sqlx::test]
    async fn test_claim_numbers_and_employee_filter(pool: PgPool) {
        let reviewer = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Radiology").await;
        let employee = create_test_employee(&pool, "xray@hospital.local", department.id).await;
        let other = create_test_employee(&pool, "other@hospital.local", department.id).await;
        let mut conn = pool.acquire().await.unwrap();
        let plan = seed_plan(&mut conn).await;

        let enrollment = Enrollments::new(&mut conn)
            .create(&EnrollmentCreateDBRequest {
                employee_id: employee.id,
                plan_id: plan.id,
                start_date: None,
            })
            .await
            .unwrap();

        let mut claims = Claims::new(&mut conn);
        let claim = claims
            .create(&ClaimCreateDBRequest {
                enrollment_id: enrollment.id,
                amount: Decimal::from(1_250),
                service_date: None,
                description: Some("MRI".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.claim_number.starts_with("CLM-"));
        assert!(claim.claim_number.ends_with(&format!("{:06}", claim.id)));
        assert_eq!(claims.owner(claim.id).await.unwrap(), Some(employee.id));

        let mine = ClaimFilter {
            limit: 10,
            employee_id: Some(employee.id),
            ..Default::default()
        };
        assert_eq!(claims.count(&mine).await.unwrap(), 1);
        let theirs = ClaimFilter {
            employee_id: Some(other.id),
            ..mine
        };
        assert_eq!(claims.count(&theirs).await.unwrap(), 0);

        let approved = claims
            .transition(claim.id, ClaimStatus::Pending, ClaimStatus::Approved, reviewer.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);
        assert!(claims
            .transition(claim.id, ClaimStatus::Pending, ClaimStatus::Denied, reviewer.id, None)
            .await
            .unwrap()
            .is_none());
    }
}
