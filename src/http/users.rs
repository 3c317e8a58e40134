//! Account endpoints: registration, sessions, profile and password flows,
//! plus the admin user management surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{password, token};
use crate::domain::access::{Principal, ROLE_CUSTOMER};
use crate::error::{ApiError, ApiResult};

use super::{message, ok, AppState, MessageBody, Success};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    "id, name, email, phone, address, city, state, pincode, profile_image, is_active, created_at";

#[derive(Debug, Serialize)]
pub struct AuthBody {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct UserWithRolesBody {
    pub user: UserView,
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub phone: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Success<AuthBody>>)> {
    payload.validate()?;
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Validation("User already exists".into()));
    }

    let hashed = password::hash_password(&payload.password)?;
    let sql = format!(
        "INSERT INTO users (id, name, email, password, phone, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW()) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, UserView>(&sql)
        .bind(Uuid::now_v7())
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&hashed)
        .bind(&payload.phone)
        .fetch_one(&state.db)
        .await?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2")
        .bind(user.id)
        .bind(ROLE_CUSTOMER)
        .execute(&state.db)
        .await?;

    let token = token::issue_token(&state.config.jwt_secret, user.id, &[ROLE_CUSTOMER.to_string()])?;
    Ok((StatusCode::CREATED, ok(AuthBody { token, user })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, sqlx::FromRow)]
struct Credentials {
    id: Uuid,
    password: String,
    is_active: bool,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<Success<AuthBody>>> {
    payload.validate()?;
    let creds = sqlx::query_as::<_, Credentials>(
        "SELECT id, password, is_active FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::Unauthenticated("Invalid credentials".into()))?;

    if !password::verify_password(&payload.password, &creds.password)? {
        return Err(ApiError::Unauthenticated("Invalid credentials".into()));
    }
    if !creds.is_active {
        return Err(ApiError::Forbidden("Account is deactivated, please contact support".into()));
    }

    let roles = user_roles(&state.db, creds.id).await?;
    let token = token::issue_token(&state.config.jwt_secret, creds.id, &roles)?;
    let user = fetch_user(&state.db, creds.id).await?;
    Ok(ok(AuthBody { token, user }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<UserWithRolesBody>>> {
    let user = fetch_user(&state.db, principal.id).await?;
    let roles = user_roles(&state.db, principal.id).await?;
    Ok(ok(UserWithRolesBody { user, roles }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub profile_image: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Success<UserBody>>> {
    payload.validate()?;
    let sql = format!(
        "UPDATE users SET name = COALESCE($2, name), phone = COALESCE($3, phone), \
         address = COALESCE($4, address), city = COALESCE($5, city), state = COALESCE($6, state), \
         pincode = COALESCE($7, pincode), profile_image = COALESCE($8, profile_image), \
         updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, UserView>(&sql)
        .bind(principal.id)
        .bind(&payload.name)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.pincode)
        .bind(&payload.profile_image)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(ok(UserBody { user }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Success<MessageBody>>> {
    payload.validate()?;
    let stored: (String,) = sqlx::query_as("SELECT password FROM users WHERE id = $1")
        .bind(principal.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    if !password::verify_password(&payload.current_password, &stored.0)? {
        return Err(ApiError::Validation("Current password is incorrect".into()));
    }
    let hashed = password::hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
        .bind(principal.id)
        .bind(&hashed)
        .execute(&state.db)
        .await?;
    Ok(message("Password changed successfully"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Success<MessageBody>>> {
    payload.validate()?;
    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await?;
    let Some((user_id,)) = user else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    let (reset_token, digest) = token::generate_reset_token();
    let expires = Utc::now() + Duration::minutes(token::RESET_TOKEN_TTL_MINUTES);
    sqlx::query(
        "UPDATE users SET reset_password_token = $2, reset_password_expire = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(&digest)
    .bind(expires)
    .execute(&state.db)
    .await?;

    // Mail delivery is out of band; the link is logged for operators.
    tracing::info!(%user_id, %reset_token, "password reset token issued");
    Ok(message("Password reset email sent"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Success<MessageBody>>> {
    payload.validate()?;
    let digest = token::hash_reset_token(&reset_token);
    let user: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM users WHERE reset_password_token = $1 AND reset_password_expire > NOW()",
    )
    .bind(&digest)
    .fetch_optional(&state.db)
    .await?;
    let Some((user_id,)) = user else {
        return Err(ApiError::Validation("Invalid or expired reset token".into()));
    };

    let hashed = password::hash_password(&payload.password)?;
    sqlx::query(
        "UPDATE users SET password = $2, reset_password_token = NULL, reset_password_expire = NULL, \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(&hashed)
    .execute(&state.db)
    .await?;
    Ok(message("Password reset successful"))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminUserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UsersBody {
    pub users: Vec<AdminUserView>,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Success<UsersBody>>> {
    let users = sqlx::query_as::<_, AdminUserView>(
        "SELECT u.id, u.name, u.email, u.phone, u.is_active, u.created_at, \
         COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), ARRAY[]::TEXT[]) AS roles \
         FROM users u \
         LEFT JOIN user_roles ur ON ur.user_id = u.id \
         LEFT JOIN roles r ON r.id = ur.role_id \
         GROUP BY u.id ORDER BY u.created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(ok(UsersBody { users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<UserWithRolesBody>>> {
    let user = fetch_user(&state.db, id).await?;
    let roles = user_roles(&state.db, id).await?;
    Ok(ok(UserWithRolesBody { user, roles }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Please include a valid email"))]
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub role_ids: Option<Vec<Uuid>>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> ApiResult<Json<Success<UserWithRolesBody>>> {
    payload.validate()?;
    let sql = format!(
        "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
         is_active = COALESCE($4, is_active), updated_at = NOW() WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, UserView>(&sql)
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(payload.is_active)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if let Some(role_ids) = &payload.role_ids {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&state.db)
            .await?;
        for role_id in role_ids {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(role_id)
            .execute(&state.db)
            .await?;
        }
    }

    let roles = user_roles(&state.db, id).await?;
    Ok(ok(UserWithRolesBody { user, roles }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    Ok(message("User deleted successfully"))
}

async fn fetch_user(db: &sqlx::PgPool, id: Uuid) -> ApiResult<UserView> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, UserView>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(user)
}

async fn user_roles(db: &sqlx::PgPool, user_id: Uuid) -> ApiResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
