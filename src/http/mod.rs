//! HTTP surface: shared state, response envelope and the router.

pub mod bookings;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod dashboard;
pub mod device_models;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod repair_services;
pub mod users;
pub mod wishlist;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::events::EventPublisher;
use crate::service::{CartService, WishlistService};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub carts: CartService,
    pub wishlists: WishlistService,
    pub events: EventPublisher,
}

/// Success envelope: `{"success": true, ...body}`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub(crate) fn ok<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success { success: true, body })
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub(crate) fn message(msg: impl Into<String>) -> Json<Success<MessageBody>> {
    ok(MessageBody { message: msg.into() })
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub(crate) fn page_window(page: Option<u32>, per_page: Option<u32>) -> (u32, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page as i64, (page as i64 - 1) * per_page as i64)
}

pub(crate) fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/v1/users/register", post(users::register))
        .route("/api/v1/users/login", post(users::login))
        .route("/api/v1/users/forgot-password", post(users::forgot_password))
        .route("/api/v1/users/reset-password/:token", put(users::reset_password))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/featured", get(products::featured_products))
        .route("/api/v1/products/:id", get(products::get_product))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/categories/:id", get(categories::get_category))
        .route("/api/v1/brands", get(brands::list_brands))
        .route("/api/v1/brands/slug/:slug", get(brands::get_brand_by_slug))
        .route("/api/v1/brands/category/:category_id", get(brands::brands_by_category))
        .route("/api/v1/brands/:id", get(brands::get_brand))
        .route("/api/v1/device-models", get(device_models::list_models))
        .route("/api/v1/device-models/:id", get(device_models::get_model))
        .route("/api/v1/repair-services", get(repair_services::list_services))
        .route("/api/v1/repair-services/featured", get(repair_services::featured_services))
        .route("/api/v1/repair-services/:id", get(repair_services::get_service));

    let protected = Router::new()
        .route("/api/v1/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/api/v1/users/change-password", put(users::change_password))
        .route("/api/v1/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route("/api/v1/cart/items/:product_id", put(cart::update_item).delete(cart::remove_item))
        .route("/api/v1/wishlist", get(wishlist::get_wishlist).delete(wishlist::clear_wishlist))
        .route("/api/v1/wishlist/items", post(wishlist::add_item))
        .route("/api/v1/wishlist/items/:product_id", delete(wishlist::remove_item))
        .route("/api/v1/orders", post(orders::create_order).get(orders::my_orders))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/cancel", put(orders::cancel_order))
        .route("/api/v1/bookings", post(bookings::create_booking).get(bookings::my_bookings))
        .route("/api/v1/bookings/:id", get(bookings::get_booking))
        .route("/api/v1/bookings/:id/status", put(bookings::update_own_status))
        .route("/api/v1/dashboard/stats", get(dashboard::user_stats))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let admin = Router::new()
        .route("/api/v1/admin/users", get(users::list_users))
        .route(
            "/api/v1/admin/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/api/v1/admin/products", post(products::create_product))
        .route(
            "/api/v1/admin/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/v1/admin/products/:id/images", post(products::add_product_image))
        .route("/api/v1/admin/product-images/:id", delete(products::delete_product_image))
        .route("/api/v1/admin/categories", post(categories::create_category))
        .route(
            "/api/v1/admin/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/v1/admin/brands", post(brands::create_brand))
        .route("/api/v1/admin/brands/:id", put(brands::update_brand).delete(brands::delete_brand))
        .route("/api/v1/admin/device-models", post(device_models::create_model))
        .route(
            "/api/v1/admin/device-models/:id",
            put(device_models::update_model).delete(device_models::delete_model),
        )
        .route("/api/v1/admin/repair-services", post(repair_services::create_service))
        .route(
            "/api/v1/admin/repair-services/:id",
            put(repair_services::update_service).delete(repair_services::delete_service),
        )
        .route("/api/v1/admin/orders", get(orders::list_all_orders))
        .route("/api/v1/admin/orders/:id/status", put(orders::update_order_status))
        .route("/api/v1/admin/bookings", get(bookings::list_all_bookings))
        .route("/api/v1/admin/bookings/:id", put(bookings::update_booking))
        .route("/api/v1/admin/stats", get(dashboard::admin_stats))
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    public
        .merge(protected)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "repairhub"}))
}
