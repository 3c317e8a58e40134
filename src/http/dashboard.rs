//! Dashboard statistics endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::access::Principal;
use crate::error::ApiResult;

use super::bookings::{AdminBookingView, BookingView};
use super::orders::{AdminOrderView, OrderView};
use super::{ok, AppState, Success};

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_orders: i64,
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub active_bookings: i64,
    pub cart_items: i64,
    pub wishlist_items: i64,
    pub recent_orders: Vec<OrderView>,
    pub recent_bookings: Vec<BookingView>,
}

#[derive(Debug, Serialize)]
pub struct UserStatsBody {
    pub stats: UserStats,
}

pub async fn user_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<UserStatsBody>>> {
    let total_orders = count_where(&state, "SELECT COUNT(*) FROM orders WHERE user_id = $1", principal.id).await?;
    let total_bookings =
        count_where(&state, "SELECT COUNT(*) FROM bookings WHERE user_id = $1", principal.id)
            .await?;
    let completed_bookings = count_where(
        &state,
        "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND status = 'completed'",
        principal.id,
    )
    .await?;
    let active_bookings = count_where(
        &state,
        "SELECT COUNT(*) FROM bookings WHERE user_id = $1 \
         AND status IN ('pending', 'confirmed', 'in-progress')",
        principal.id,
    )
    .await?;

    let cart = state.carts.get_cart(principal.id).await?;
    let wishlist = state.wishlists.get_wishlist(principal.id).await?;

    let recent_orders = sqlx::query_as::<_, OrderView>(
        "SELECT id, order_number, user_id, status, total_amount, payment_method, \
         shipping_address, notes, created_at \
         FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT 3",
    )
    .bind(principal.id)
    .fetch_all(&state.db)
    .await?;

    let recent_bookings = sqlx::query_as::<_, BookingView>(
        "SELECT b.id, b.booking_number, b.user_id, b.service_id, s.name AS service_name, \
         b.device_model_id, m.name AS device_model_name, b.technician_id, t.name AS technician_name, \
         b.status, b.scheduled_at, b.total_amount, b.problem_description, b.address, b.city, \
         b.state, b.pincode, b.notes, b.created_at \
         FROM bookings b \
         JOIN services s ON s.id = b.service_id \
         LEFT JOIN device_models m ON m.id = b.device_model_id \
         LEFT JOIN users t ON t.id = b.technician_id \
         WHERE b.user_id = $1 ORDER BY b.created_at DESC LIMIT 3",
    )
    .bind(principal.id)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(UserStatsBody {
        stats: UserStats {
            total_orders,
            total_bookings,
            completed_bookings,
            active_bookings,
            cart_items: cart.item_count() as i64,
            wishlist_items: wishlist.entries().len() as i64,
            recent_orders,
            recent_bookings,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_products: i64,
    pub total_services: i64,
    pub total_brands: i64,
    pub total_categories: i64,
    pub total_device_models: i64,
    pub total_orders: i64,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub new_users_last_30_days: i64,
    pub orders_last_30_days: i64,
    pub bookings_last_30_days: i64,
    pub revenue_last_30_days: Decimal,
    pub recent_orders: Vec<AdminOrderView>,
    pub recent_bookings: Vec<AdminBookingView>,
}

#[derive(Debug, Serialize)]
pub struct AdminStatsBody {
    pub stats: AdminStats,
}

pub async fn admin_stats(State(state): State<AppState>) -> ApiResult<Json<Success<AdminStatsBody>>> {
    let total_users = count(&state, "SELECT COUNT(*) FROM users").await?;
    let total_products = count(&state, "SELECT COUNT(*) FROM products").await?;
    let total_services = count(&state, "SELECT COUNT(*) FROM services").await?;
    let total_brands = count(&state, "SELECT COUNT(*) FROM brands").await?;
    let total_categories = count(&state, "SELECT COUNT(*) FROM categories").await?;
    let total_device_models = count(&state, "SELECT COUNT(*) FROM device_models").await?;
    let total_orders = count(&state, "SELECT COUNT(*) FROM orders").await?;
    let total_bookings = count(&state, "SELECT COUNT(*) FROM bookings").await?;
    let new_users_last_30_days =
        count(&state, "SELECT COUNT(*) FROM users WHERE created_at > NOW() - INTERVAL '30 days'")
            .await?;
    let orders_last_30_days =
        count(&state, "SELECT COUNT(*) FROM orders WHERE created_at > NOW() - INTERVAL '30 days'")
            .await?;
    let bookings_last_30_days = count(
        &state,
        "SELECT COUNT(*) FROM bookings WHERE created_at > NOW() - INTERVAL '30 days'",
    )
    .await?;

    let (total_revenue,): (Decimal,) =
        sqlx::query_as("SELECT COALESCE(SUM(total_amount), 0) FROM orders")
            .fetch_one(&state.db)
            .await?;
    let (revenue_last_30_days,): (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0) FROM orders \
         WHERE created_at > NOW() - INTERVAL '30 days'",
    )
    .fetch_one(&state.db)
    .await?;

    let recent_orders = sqlx::query_as::<_, AdminOrderView>(
        "SELECT o.id, o.order_number, o.user_id, u.name AS user_name, u.email AS user_email, \
         o.status, o.total_amount, o.payment_method, o.created_at \
         FROM orders o JOIN users u ON u.id = o.user_id \
         ORDER BY o.created_at DESC LIMIT 5",
    )
    .fetch_all(&state.db)
    .await?;

    let recent_bookings = sqlx::query_as::<_, AdminBookingView>(
        "SELECT b.id, b.booking_number, b.user_id, u.name AS user_name, u.email AS user_email, \
         b.service_id, s.name AS service_name, b.technician_id, t.name AS technician_name, \
         b.status, b.scheduled_at, b.total_amount, b.created_at \
         FROM bookings b \
         JOIN users u ON u.id = b.user_id \
         JOIN services s ON s.id = b.service_id \
         LEFT JOIN users t ON t.id = b.technician_id \
         ORDER BY b.created_at DESC LIMIT 5",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(ok(AdminStatsBody {
        stats: AdminStats {
            total_users,
            total_products,
            total_services,
            total_brands,
            total_categories,
            total_device_models,
            total_orders,
            total_bookings,
            total_revenue,
            new_users_last_30_days,
            orders_last_30_days,
            bookings_last_30_days,
            revenue_last_30_days,
            recent_orders,
            recent_bookings,
        },
    }))
}

async fn count(state: &AppState, sql: &str) -> ApiResult<i64> {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&state.db).await?;
    Ok(n)
}

async fn count_where(state: &AppState, sql: &str, id: Uuid) -> ApiResult<i64> {
    let (n,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(&state.db).await?;
    Ok(n)
}
