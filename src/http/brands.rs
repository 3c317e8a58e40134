//! Brand endpoints.

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
pub struct BrandView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const BRAND_COLUMNS: &str = "id, name, slug, logo, description, is_active, created_at";

#[derive(Debug, Serialize)]
pub struct BrandsBody {
    pub brands: Vec<BrandView>,
}

#[derive(Debug, Serialize)]
pub struct BrandBody {
    pub brand: BrandView,
}

pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Json<Success<BrandsBody>>> {
    let sql = format!("SELECT {BRAND_COLUMNS} FROM brands WHERE is_active = TRUE ORDER BY name");
    let brands = sqlx::query_as::<_, BrandView>(&sql).fetch_all(&state.db).await?;
    Ok(ok(BrandsBody { brands }))
}

pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<BrandBody>>> {
    let sql = format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1");
    let brand = sqlx::query_as::<_, BrandView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".into()))?;
    Ok(ok(BrandBody { brand }))
}

pub async fn get_brand_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Success<BrandBody>>> {
    let sql = format!("SELECT {BRAND_COLUMNS} FROM brands WHERE slug = $1");
    let brand = sqlx::query_as::<_, BrandView>(&sql)
        .bind(&slug)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".into()))?;
    Ok(ok(BrandBody { brand }))
}

/// Brands that have at least one device model in the given category.
pub async fn brands_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<Success<BrandsBody>>> {
    let brands = sqlx::query_as::<_, BrandView>(
        "SELECT DISTINCT b.id, b.name, b.slug, b.logo, b.description, b.is_active, b.created_at \
         FROM brands b JOIN device_models m ON m.brand_id = b.id \
         WHERE m.category_id = $1 AND b.is_active = TRUE ORDER BY b.name",
    )
    .bind(category_id)
    .fetch_all(&state.db)
    .await?;
    Ok(ok(BrandsBody { brands }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub logo: Option<String>,
    pub description: Option<String>,
}

pub async fn create_brand(
    State(state): State<AppState>,
    Json(payload): Json<CreateBrandRequest>,
) -> ApiResult<(StatusCode, Json<Success<BrandBody>>)> {
    payload.validate()?;

    let id = Uuid::now_v7();
    let sql = format!(
        "INSERT INTO brands (id, name, slug, logo, description, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW()) RETURNING {BRAND_COLUMNS}"
    );
    let brand = sqlx::query_as::<_, BrandView>(&sql)
        .bind(id)
        .bind(&payload.name)
        .bind(slugify(&payload.name))
        .bind(&payload.logo)
        .bind(&payload.description)
        .fetch_one(&state.db)
        .await?;
    Ok((StatusCode::CREATED, ok(BrandBody { brand })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBrandRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBrandRequest>,
) -> ApiResult<Json<Success<BrandBody>>> {
    payload.validate()?;

    let slug = payload.name.as_deref().map(slugify);
    let sql = format!(
        "UPDATE brands SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
         logo = COALESCE($4, logo), description = COALESCE($5, description), \
         is_active = COALESCE($6, is_active), updated_at = NOW() \
         WHERE id = $1 RETURNING {BRAND_COLUMNS}"
    );
    let brand = sqlx::query_as::<_, BrandView>(&sql)
        .bind(id)
        .bind(&payload.name)
        .bind(&slug)
        .bind(&payload.logo)
        .bind(&payload.description)
        .bind(payload.is_active)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".into()))?;
    Ok(ok(BrandBody { brand }))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result = sqlx::query("DELETE FROM brands WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Brand not found".into()));
    }
    Ok(message("Brand deleted successfully"))
}
