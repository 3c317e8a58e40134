//! Wishlist endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ProductSummary;
use crate::domain::access::Principal;
use crate::domain::wishlist::WishlistDocument;
use crate::error::ApiResult;

use super::{ok, AppState, Success};

#[derive(Debug, Serialize)]
pub struct WishlistBody {
    pub wishlist: WishlistDocument,
    pub products: Vec<ProductSummary>,
}

/// Joins the saved entries against the live catalog so the client can
/// render current names and prices. Products deleted since they were
/// saved simply drop out of `products`.
async fn wishlist_body(state: &AppState, wishlist: WishlistDocument) -> ApiResult<WishlistBody> {
    let ids: Vec<Uuid> = wishlist.entries().iter().map(|e| e.product_id).collect();
    let products = if ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as::<_, ProductSummary>(
            "SELECT p.id, p.name, p.price, \
             (SELECT url FROM product_images WHERE product_id = p.id ORDER BY position, created_at LIMIT 1) AS image \
             FROM products p WHERE p.id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&state.db)
        .await?
    };
    Ok(WishlistBody { wishlist, products })
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<WishlistBody>>> {
    let wishlist = state.wishlists.get_wishlist(principal.id).await?;
    Ok(ok(wishlist_body(&state, wishlist).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AddItemRequest>,
) -> ApiResult<Json<Success<WishlistBody>>> {
    let wishlist = state.wishlists.add_product(principal.id, payload.product_id).await?;
    Ok(ok(wishlist_body(&state, wishlist).await?))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Success<WishlistBody>>> {
    let wishlist = state.wishlists.remove_product(principal.id, product_id).await?;
    Ok(ok(wishlist_body(&state, wishlist).await?))
}

pub async fn clear_wishlist(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<WishlistBody>>> {
    let wishlist = state.wishlists.clear_wishlist(principal.id).await?;
    Ok(ok(wishlist_body(&state, wishlist).await?))
}
