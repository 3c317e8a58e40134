//! Repair service endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

use super::{message, ok, slugify, AppState, MessageBody, Success};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub warranty_days: Option<i32>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const SERVICE_COLUMNS: &str = "s.id, s.name, s.slug, s.description, s.price, s.discount_price, \
     s.duration_minutes, s.warranty_days, s.category_id, c.name AS category_name, s.image, \
     s.featured, s.is_active, s.created_at";

const SERVICE_JOINS: &str = "FROM services s LEFT JOIN categories c ON c.id = s.category_id";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ServicesBody {
    pub services: Vec<ServiceView>,
}

#[derive(Debug, Serialize)]
pub struct ServiceBody {
    pub service: ServiceView,
}

pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Success<ServicesBody>>> {
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} {SERVICE_JOINS} WHERE s.is_active = TRUE \
         AND ($1::uuid IS NULL OR s.category_id = $1) \
         AND ($2::boolean IS NULL OR s.featured = $2) \
         ORDER BY s.name"
    );
    let services = sqlx::query_as::<_, ServiceView>(&sql)
        .bind(params.category)
        .bind(params.featured)
        .fetch_all(&state.db)
        .await?;
    Ok(ok(ServicesBody { services }))
}

pub async fn featured_services(
    State(state): State<AppState>,
) -> ApiResult<Json<Success<ServicesBody>>> {
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} {SERVICE_JOINS} \
         WHERE s.featured = TRUE AND s.is_active = TRUE ORDER BY s.created_at DESC LIMIT 8"
    );
    let services = sqlx::query_as::<_, ServiceView>(&sql).fetch_all(&state.db).await?;
    Ok(ok(ServicesBody { services }))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<ServiceBody>>> {
    let service = fetch_service(&state, id).await?;
    Ok(ok(ServiceBody { service }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub warranty_days: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub featured: Option<bool>,
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<Success<ServiceBody>>)> {
    payload.validate()?;
    if payload.price < Decimal::ZERO {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO services (id, name, slug, description, price, discount_price, \
         duration_minutes, warranty_days, category_id, image, featured, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, NOW(), NOW())",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(slugify(&payload.name))
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.discount_price)
    .bind(payload.duration_minutes)
    .bind(payload.warranty_days)
    .bind(payload.category_id)
    .bind(&payload.image)
    .bind(payload.featured.unwrap_or(false))
    .execute(&state.db)
    .await?;

    let service = fetch_service(&state, id).await?;
    Ok((StatusCode::CREATED, ok(ServiceBody { service })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub warranty_days: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> ApiResult<Json<Success<ServiceBody>>> {
    payload.validate()?;
    if matches!(payload.price, Some(p) if p < Decimal::ZERO) {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }

    let slug = payload.name.as_deref().map(slugify);
    let result = sqlx::query(
        "UPDATE services SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
         description = COALESCE($4, description), price = COALESCE($5, price), \
         discount_price = COALESCE($6, discount_price), duration_minutes = COALESCE($7, duration_minutes), \
         warranty_days = COALESCE($8, warranty_days), category_id = COALESCE($9, category_id), \
         image = COALESCE($10, image), featured = COALESCE($11, featured), \
         is_active = COALESCE($12, is_active), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.discount_price)
    .bind(payload.duration_minutes)
    .bind(payload.warranty_days)
    .bind(payload.category_id)
    .bind(&payload.image)
    .bind(payload.featured)
    .bind(payload.is_active)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Service not found".into()));
    }

    let service = fetch_service(&state, id).await?;
    Ok(ok(ServiceBody { service }))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result =
        sqlx::query("DELETE FROM services WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Service not found".into()));
    }
    Ok(message("Service deleted successfully"))
}

async fn fetch_service(state: &AppState, id: Uuid) -> ApiResult<ServiceView> {
    let sql = format!("SELECT {SERVICE_COLUMNS} {SERVICE_JOINS} WHERE s.id = $1");
    sqlx::query_as::<_, ServiceView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))
}
