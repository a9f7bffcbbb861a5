use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            pagination::Paginated,
            response::ApiResponse,
            users::{ListUsersQuery, UserCreate, UserResponse, UserUpdate},
        },
    },
    auth::{
        password,
        permissions::{RequiresPermission, operation, resource},
    },
    db::{
        handlers::{Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
};

/// List user accounts
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of user accounts", body = Paginated<UserResponse>),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<UserResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = UserFilter {
        role: query.role,
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..UserFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Users::new(&mut conn);
    let users: Vec<UserResponse> = repo.list(&filter).await?.into_iter().map(UserResponse::from).collect();
    let total = repo.count(&filter).await?;

    Ok(ApiResponse::ok(Paginated::new(users, &query.pagination, total)))
}

/// Create a user account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::Create>,
    ApiJson(request): ApiJson<UserCreate>,
) -> Result<ApiResponse<UserResponse>> {
    let new_user = request.validate()?;
    password::validate_password(&new_user.password, &state.config.auth.password)?;
    let password_hash = password::hash_string_blocking(new_user.password).await?;

    let mut conn = state.db.acquire().await?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: new_user.email,
            password_hash: Some(password_hash),
            role: new_user.role,
            employee_id: new_user.employee_id,
            two_factor_enabled: new_user.two_factor_enabled,
        })
        .await?;

    Ok(ApiResponse::created(UserResponse::from(user)).with_message("User created successfully"))
}

/// Get a user account
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User account", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<ApiResponse<UserResponse>> {
    let mut conn = state.db.acquire().await?;
    let user = Users::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("User", id))?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

fn reject_self_deactivation(caller: UserId, target: UserId) -> Result<()> {
    if caller == target {
        return Err(Error::BadRequest {
            message: "You cannot deactivate your own account".to_string(),
        });
    }
    Ok(())
}

/// Update a user account
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: RequiresPermission<resource::Users, operation::Update>,
    ApiJson(request): ApiJson<UserUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    let mut changes = request.validate()?;
    if changes.is_active == Some(false) {
        reject_self_deactivation(current_user.id, id)?;
    }

    let password_hash = match changes.password.take() {
        Some(new_password) => {
            password::validate_password(&new_password, &state.config.auth.password)?;
            Some(password::hash_string_blocking(new_password).await?)
        }
        None => None,
    };

    let mut conn = state.db.acquire().await?;
    let user = Users::new(&mut conn)
        .update(id, &UserUpdateDBRequest::new(changes, password_hash))
        .await
        .map_err(|e| Error::from_lookup(e, "User", id))?;

    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("User updated successfully"))
}

/// Deactivate a user account
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Deactivate user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated"),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: RequiresPermission<resource::Users, operation::Delete>,
) -> Result<ApiResponse<()>> {
    reject_self_deactivation(current_user.id, id)?;

    let mut conn = state.db.acquire().await?;
    if !Users::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("User", id));
    }
    Ok(ApiResponse::message_only("User deactivated successfully"))
}
