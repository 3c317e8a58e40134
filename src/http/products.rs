//! Product catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

use super::{message, ok, page_window, slugify, AppState, MessageBody, PaginatedResponse, Success};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock: i32,
    pub featured: bool,
    pub is_active: bool,
    pub sku: Option<String>,
    pub warranty_days: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub brand_name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.price, p.discount_price, \
     p.stock, p.featured, p.is_active, p.sku, p.warranty_days, p.specifications, p.category_id, \
     p.brand_id, c.name AS category_name, b.name AS brand_name, \
     (SELECT url FROM product_images WHERE product_id = p.id ORDER BY position, created_at LIMIT 1) AS image, \
     p.created_at";

const PRODUCT_JOINS: &str = "FROM products p \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN brands b ON b.id = p.brand_id";

const PRODUCT_FILTERS: &str = "p.is_active = TRUE \
     AND ($1::uuid IS NULL OR p.category_id = $1) \
     AND ($2::uuid IS NULL OR p.brand_id = $2) \
     AND ($3::boolean IS NULL OR p.featured = $3) \
     AND ($4::text IS NULL OR p.name ILIKE '%' || $4 || '%' OR p.description ILIKE '%' || $4 || '%')";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub brand: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

fn parse_sort(sort: Option<&str>) -> &'static str {
    match sort {
        Some("name:asc") => "p.name ASC",
        Some("name:desc") => "p.name DESC",
        Some("price:asc") => "p.price ASC",
        Some("price:desc") => "p.price DESC",
        Some("created_at:asc") => "p.created_at ASC",
        _ => "p.created_at DESC",
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Success<PaginatedResponse<ProductView>>>> {
    let (page, limit, offset) = page_window(params.page, params.per_page);
    let sort = parse_sort(params.sort.as_deref());

    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} {PRODUCT_JOINS} WHERE {PRODUCT_FILTERS} \
         ORDER BY {sort} LIMIT $5 OFFSET $6"
    );
    let products = sqlx::query_as::<_, ProductView>(&sql)
        .bind(params.category)
        .bind(params.brand)
        .bind(params.featured)
        .bind(&params.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM products p WHERE {PRODUCT_FILTERS}");
    let total: (i64,) = sqlx::query_as(&count_sql)
        .bind(params.category)
        .bind(params.brand)
        .bind(params.featured)
        .bind(&params.search)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(PaginatedResponse { data: products, total: total.0, page }))
}

#[derive(Debug, Serialize)]
pub struct ProductsBody {
    pub products: Vec<ProductView>,
}

pub async fn featured_products(
    State(state): State<AppState>,
) -> ApiResult<Json<Success<ProductsBody>>> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} {PRODUCT_JOINS} \
         WHERE p.featured = TRUE AND p.is_active = TRUE ORDER BY p.created_at DESC LIMIT 8"
    );
    let products = sqlx::query_as::<_, ProductView>(&sql).fetch_all(&state.db).await?;
    Ok(ok(ProductsBody { products }))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductImageView {
    pub id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductDetailBody {
    pub product: ProductView,
    pub images: Vec<ProductImageView>,
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<ProductDetailBody>>> {
    let product = fetch_product(&state, id).await?;
    let images = product_images(&state, id).await?;
    Ok(ok(ProductDetailBody { product, images }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub sku: Option<String>,
    pub warranty_days: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Success<ProductDetailBody>>)> {
    payload.validate()?;
    if payload.price < Decimal::ZERO {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }

    let id = Uuid::now_v7();
    let slug = slugify(&payload.name);
    sqlx::query(
        "INSERT INTO products (id, name, slug, description, price, discount_price, stock, \
         featured, is_active, sku, warranty_days, specifications, category_id, brand_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $10, $11, $12, $13, NOW(), NOW())",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.discount_price)
    .bind(payload.stock.unwrap_or(0))
    .bind(payload.featured.unwrap_or(false))
    .bind(&payload.sku)
    .bind(payload.warranty_days)
    .bind(&payload.specifications)
    .bind(payload.category_id)
    .bind(payload.brand_id)
    .execute(&state.db)
    .await?;

    if let Some(images) = &payload.images {
        for (position, url) in images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (id, product_id, url, position, created_at) \
                 VALUES ($1, $2, $3, $4, NOW())",
            )
            .bind(Uuid::now_v7())
            .bind(id)
            .bind(url)
            .bind(position as i32)
            .execute(&state.db)
            .await?;
        }
    }

    let product = fetch_product(&state, id).await?;
    let images = product_images(&state, id).await?;
    Ok((StatusCode::CREATED, ok(ProductDetailBody { product, images })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
    pub sku: Option<String>,
    pub warranty_days: Option<i32>,
    pub specifications: Option<serde_json::Value>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> ApiResult<Json<Success<ProductDetailBody>>> {
    payload.validate()?;
    if matches!(payload.price, Some(p) if p < Decimal::ZERO) {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }

    let slug = payload.name.as_deref().map(slugify);
    let result = sqlx::query(
        "UPDATE products SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
         description = COALESCE($4, description), price = COALESCE($5, price), \
         discount_price = COALESCE($6, discount_price), stock = COALESCE($7, stock), \
         featured = COALESCE($8, featured), is_active = COALESCE($9, is_active), \
         sku = COALESCE($10, sku), warranty_days = COALESCE($11, warranty_days), \
         specifications = COALESCE($12, specifications), category_id = COALESCE($13, category_id), \
         brand_id = COALESCE($14, brand_id), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.discount_price)
    .bind(payload.stock)
    .bind(payload.featured)
    .bind(payload.is_active)
    .bind(&payload.sku)
    .bind(payload.warranty_days)
    .bind(&payload.specifications)
    .bind(payload.category_id)
    .bind(payload.brand_id)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    let product = fetch_product(&state, id).await?;
    let images = product_images(&state, id).await?;
    Ok(ok(ProductDetailBody { product, images }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result =
        sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    Ok(message("Product deleted successfully"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddImageRequest {
    #[validate(length(min = 1, message = "Image URL is required"))]
    pub url: String,
    pub position: Option<i32>,
}

pub async fn add_product_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageRequest>,
) -> ApiResult<(StatusCode, Json<Success<ProductDetailBody>>)> {
    payload.validate()?;
    sqlx::query(
        "INSERT INTO product_images (id, product_id, url, position, created_at) \
         VALUES ($1, $2, $3, $4, NOW())",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(&payload.url)
    .bind(payload.position.unwrap_or(0))
    .execute(&state.db)
    .await?;

    let product = fetch_product(&state, id).await?;
    let images = product_images(&state, id).await?;
    Ok((StatusCode::CREATED, ok(ProductDetailBody { product, images })))
}

pub async fn delete_product_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<MessageBody>>> {
    let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product image not found".into()));
    }
    Ok(message("Product image deleted successfully"))
}

async fn fetch_product(state: &AppState, id: Uuid) -> ApiResult<ProductView> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} {PRODUCT_JOINS} WHERE p.id = $1");
    sqlx::query_as::<_, ProductView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))
}

async fn product_images(state: &AppState, product_id: Uuid) -> ApiResult<Vec<ProductImageView>> {
    let images = sqlx::query_as::<_, ProductImageView>(
        "SELECT id, url, position FROM product_images WHERE product_id = $1 \
         ORDER BY position, created_at",
    )
    .bind(product_id)
    .fetch_all(&state.db)
    .await?;
    Ok(images)
}
