//! Order endpoints.
//!
//! Order lines snapshot the product name and price at checkout time, the
//! same way cart lines do, so later catalog edits never rewrite history.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Principal;
use crate::error::{ApiError, ApiResult};
use crate::events::DomainEvent;

use super::{ok, page_window, AppState, PaginatedResponse, Success};

pub const ORDER_STATUSES: [&str; 5] =
    ["pending", "processing", "shipped", "delivered", "cancelled"];

const PAYMENT_METHODS: [&str; 5] = ["credit_card", "debit_card", "paypal", "upi", "cod"];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub shipping_address: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total_amount, payment_method, \
     shipping_address, notes, created_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub variant: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub order: OrderWithItems,
}

#[derive(Debug, Serialize)]
pub struct OrdersBody {
    pub orders: Vec<OrderWithItems>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i64,
    pub variant: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Success<OrderBody>>)> {
    if payload.items.is_empty() {
        return Err(ApiError::Validation("Order must contain at least one item".into()));
    }
    if payload.items.iter().any(|line| line.quantity < 1) {
        return Err(ApiError::Validation("Quantity must be at least 1".into()));
    }
    let payment_method = payload.payment_method.as_deref().unwrap_or("cod");
    if !PAYMENT_METHODS.contains(&payment_method) {
        return Err(ApiError::Validation("Invalid payment method".into()));
    }
    let shipping_address = match &payload.shipping_address {
        Some(v) if !v.is_null() => v,
        _ => return Err(ApiError::Validation("Shipping address is required".into())),
    };

    let mut tx = state.db.begin().await?;

    // Resolve every line before writing anything so a bad product id
    // aborts the whole order.
    let mut resolved: Vec<(OrderLineRequest, String, Decimal)> = Vec::new();
    for line in payload.items {
        let product: Option<(String, Decimal)> =
            sqlx::query_as("SELECT name, price FROM products WHERE id = $1")
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((name, price)) = product else {
            return Err(ApiError::NotFound(format!("Product {} not found", line.product_id)));
        };
        resolved.push((line, name, price));
    }

    let total_amount: Decimal = resolved
        .iter()
        .fold(Decimal::ZERO, |acc, (line, _, unit)| acc + *unit * Decimal::from(line.quantity));

    let order_id = Uuid::now_v7();
    let order_number = format!("ORD-{:08}", rand::random::<u32>() % 100_000_000);
    let sql = format!(
        "INSERT INTO orders (id, order_number, user_id, status, total_amount, payment_method, \
         shipping_address, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, NOW(), NOW()) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, OrderView>(&sql)
        .bind(order_id)
        .bind(&order_number)
        .bind(principal.id)
        .bind(total_amount)
        .bind(payment_method)
        .bind(shipping_address)
        .bind(&payload.notes)
        .fetch_one(&mut *tx)
        .await?;

    for (line, name, unit_price) in &resolved {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, variant, quantity, unit_price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
        )
        .bind(Uuid::now_v7())
        .bind(order_id)
        .bind(line.product_id)
        .bind(name)
        .bind(&line.variant)
        .bind(line.quantity as i32)
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    state
        .events
        .publish(&DomainEvent::OrderPlaced {
            order_id,
            order_number: order_number.clone(),
            user_id: principal.id,
            total_amount,
        })
        .await;
    tracing::info!(%order_id, %order_number, "order placed");

    let items = order_items(&state, &[order_id]).await?.remove(&order_id).unwrap_or_default();
    Ok((StatusCode::CREATED, ok(OrderBody { order: OrderWithItems { order, items } })))
}

pub async fn my_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<OrdersBody>>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    );
    let orders = sqlx::query_as::<_, OrderView>(&sql)
        .bind(principal.id)
        .fetch_all(&state.db)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items = order_items(&state, &ids).await?;
    let orders = orders
        .into_iter()
        .map(|order| {
            let items = items.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect();
    Ok(ok(OrdersBody { orders }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<OrderBody>>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
    let order = sqlx::query_as::<_, OrderView>(&sql)
        .bind(id)
        .bind(principal.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    let items = order_items(&state, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(ok(OrderBody { order: OrderWithItems { order, items } }))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<OrderBody>>> {
    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM orders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(principal.id)
            .fetch_optional(&state.db)
            .await?;
    let Some((status,)) = status else {
        return Err(ApiError::NotFound("Order not found".into()));
    };
    if status == "delivered" || status == "cancelled" {
        return Err(ApiError::Validation(format!(
            "Cannot cancel an order that is already {status}"
        )));
    }

    let sql = format!(
        "UPDATE orders SET status = 'cancelled', updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, OrderView>(&sql)
        .bind(id)
        .bind(principal.id)
        .fetch_one(&state.db)
        .await?;

    state
        .events
        .publish(&DomainEvent::OrderStatusChanged { order_id: id, status: "cancelled".into() })
        .await;

    let items = order_items(&state, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(ok(OrderBody { order: OrderWithItems { order, items } }))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AdminListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

pub async fn list_all_orders(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<Json<Success<PaginatedResponse<AdminOrderView>>>> {
    let (page, limit, offset) = page_window(params.page, params.per_page);

    let orders = sqlx::query_as::<_, AdminOrderView>(
        "SELECT o.id, o.order_number, o.user_id, u.name AS user_name, u.email AS user_email, \
         o.status, o.total_amount, o.payment_method, o.created_at \
         FROM orders o JOIN users u ON u.id = o.user_id \
         WHERE ($1::text IS NULL OR o.status = $1) \
         ORDER BY o.created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&params.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(&params.status)
            .fetch_one(&state.db)
            .await?;

    Ok(ok(PaginatedResponse { data: orders, total: total.0, page }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Success<OrderBody>>> {
    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::Validation("Invalid order status".into()));
    }

    let sql = format!(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, OrderView>(&sql)
        .bind(id)
        .bind(&payload.status)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    state
        .events
        .publish(&DomainEvent::OrderStatusChanged { order_id: id, status: payload.status.clone() })
        .await;
    tracing::info!(%id, status = %payload.status, "order status updated");

    let items = order_items(&state, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(ok(OrderBody { order: OrderWithItems { order, items } }))
}

async fn order_items(
    state: &AppState,
    order_ids: &[Uuid],
) -> ApiResult<HashMap<Uuid, Vec<OrderItemView>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, OrderItemView>(
        "SELECT id, order_id, product_id, name, variant, quantity, unit_price \
         FROM order_items WHERE order_id = ANY($1) ORDER BY created_at",
    )
    .bind(order_ids)
    .fetch_all(&state.db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}
