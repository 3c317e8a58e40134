//! Category endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

use super::{message, ok, slugify, AppState, MessageBody, Success};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, is_active, created_at";

#[derive(Debug, Serialize)]
pub struct CategoriesBody {
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryBody {
    pub category: CategoryView,
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Success<CategoriesBody>>> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = TRUE ORDER BY name"
    );
    let categories = sqlx::query_as::<_, CategoryView>(&sql).fetch_all(&state.db).await?;
    Ok(ok(CategoriesBody { categories }))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<CategoryBody>>> {
    let category = fetch_category(&state, id).await?;
    Ok(ok(CategoryBody { category }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Success<CategoryBody>>)> {
    payload.validate()?;

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO categories (id, name, slug, description, image, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW())",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(slugify(&payload.name))
    .bind(&payload.description)
    .bind(&payload.image)
    .execute(&state.db)
    .await?;

    let category = fetch_category(&state, id).await?;
    Ok((StatusCode::CREATED, ok(CategoryBody { category })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Success<CategoryBody>>> {
    payload.validate()?;

    let slug = payload.name.as_deref().map(slugify);
    let result = sqlx::query(
        "UPDATE categories SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
         description = COALESCE($4, description), image = COALESCE($5, image), \
         is_active = COALESCE($6, is_active), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.image)
    .bind(payload.is_active)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Category not found".into()));
    }

    let category = fetch_category(&state, id).await?;
    Ok(ok(CategoryBody { category }))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result =
        sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    Ok(message("Category deleted successfully"))
}

async fn fetch_category(state: &AppState, id: Uuid) -> ApiResult<CategoryView> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
    sqlx::query_as::<_, CategoryView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))
}
