//! Device model endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

use super::{message, ok, slugify, AppState, MessageBody, Success};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeviceModelView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const MODEL_COLUMNS: &str = "m.id, m.name, m.slug, m.brand_id, m.category_id, \
     b.name AS brand_name, c.name AS category_name, m.image, m.description, \
     m.specifications, m.is_active, m.created_at";

const MODEL_JOINS: &str = "FROM device_models m \
     LEFT JOIN brands b ON b.id = m.brand_id \
     LEFT JOIN categories c ON c.id = m.category_id";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeviceModelsBody {
    pub device_models: Vec<DeviceModelView>,
}

#[derive(Debug, Serialize)]
pub struct DeviceModelBody {
    pub device_model: DeviceModelView,
}

pub async fn list_models(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Success<DeviceModelsBody>>> {
    let sql = format!(
        "SELECT {MODEL_COLUMNS} {MODEL_JOINS} WHERE m.is_active = TRUE \
         AND ($1::uuid IS NULL OR m.brand_id = $1) \
         AND ($2::uuid IS NULL OR m.category_id = $2) \
         ORDER BY m.name"
    );
    let device_models = sqlx::query_as::<_, DeviceModelView>(&sql)
        .bind(params.brand)
        .bind(params.category)
        .fetch_all(&state.db)
        .await?;
    Ok(ok(DeviceModelsBody { device_models }))
}

pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<DeviceModelBody>>> {
    let device_model = fetch_model(&state, id).await?;
    Ok(ok(DeviceModelBody { device_model }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeviceModelRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<serde_json::Value>,
}

pub async fn create_model(
    State(state): State<AppState>,
    Json(payload): Json<CreateDeviceModelRequest>,
) -> ApiResult<(StatusCode, Json<Success<DeviceModelBody>>)> {
    payload.validate()?;

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO device_models (id, name, slug, brand_id, category_id, image, description, \
         specifications, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, NOW(), NOW())",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(slugify(&payload.name))
    .bind(payload.brand_id)
    .bind(payload.category_id)
    .bind(&payload.image)
    .bind(&payload.description)
    .bind(&payload.specifications)
    .execute(&state.db)
    .await?;

    let device_model = fetch_model(&state, id).await?;
    Ok((StatusCode::CREATED, ok(DeviceModelBody { device_model })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeviceModelRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

pub async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeviceModelRequest>,
) -> ApiResult<Json<Success<DeviceModelBody>>> {
    payload.validate()?;

    let slug = payload.name.as_deref().map(slugify);
    let result = sqlx::query(
        "UPDATE device_models SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
         brand_id = COALESCE($4, brand_id), category_id = COALESCE($5, category_id), \
         image = COALESCE($6, image), description = COALESCE($7, description), \
         specifications = COALESCE($8, specifications), \
         is_active = COALESCE($9, is_active), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(payload.brand_id)
    .bind(payload.category_id)
    .bind(&payload.image)
    .bind(&payload.description)
    .bind(&payload.specifications)
    .bind(payload.is_active)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Device model not found".into()));
    }

    let device_model = fetch_model(&state, id).await?;
    Ok(ok(DeviceModelBody { device_model }))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result =
        sqlx::query("DELETE FROM device_models WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Device model not found".into()));
    }
    Ok(message("Device model deleted successfully"))
}

async fn fetch_model(state: &AppState, id: Uuid) -> ApiResult<DeviceModelView> {
    let sql = format!("SELECT {MODEL_COLUMNS} {MODEL_JOINS} WHERE m.id = $1");
    sqlx::query_as::<_, DeviceModelView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device model not found".into()))
}
