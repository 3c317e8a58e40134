//! Shopping cart endpoints.
//!
//! Thin HTTP shells around [`CartService`]; all cart rules live in the
//! service and the `domain::cart` document.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Principal;
use crate::domain::cart::CartDocument;
use crate::error::ApiResult;

use super::{ok, AppState, Success};

#[derive(Debug, Serialize)]
pub struct CartBody {
    pub cart: CartDocument,
    pub subtotal: Decimal,
}

fn cart_body(cart: CartDocument) -> Json<Success<CartBody>> {
    let subtotal = cart.subtotal();
    ok(CartBody { cart, subtotal })
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<CartBody>>> {
    let cart = state.carts.get_cart(principal.id).await?;
    Ok(cart_body(cart))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<i64>,
    pub variant: Option<String>,
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AddItemRequest>,
) -> ApiResult<Json<Success<CartBody>>> {
    let quantity = payload.quantity.unwrap_or(1);
    let cart = state
        .carts
        .add_item(principal.id, payload.product_id, quantity, payload.variant)
        .await?;
    Ok(cart_body(cart))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
    pub variant: Option<String>,
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> ApiResult<Json<Success<CartBody>>> {
    let cart = state
        .carts
        .update_item_quantity(
            principal.id,
            product_id,
            payload.quantity,
            payload.variant.as_deref(),
        )
        .await?;
    Ok(cart_body(cart))
}

#[derive(Debug, Deserialize)]
pub struct VariantParams {
    pub variant: Option<String>,
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<VariantParams>,
) -> ApiResult<Json<Success<CartBody>>> {
    let cart = state
        .carts
        .remove_item(principal.id, product_id, params.variant.as_deref())
        .await?;
    Ok(cart_body(cart))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<CartBody>>> {
    let cart = state.carts.clear_cart(principal.id).await?;
    Ok(cart_body(cart))
}
