//! Versioned document persistence for carts and wishlists.
//!
//! Documents are stored whole in a JSONB column guarded by an integer
//! version. Saves are compare-and-swap: a writer that lost the race gets
//! [`StoreError::Conflict`] and the caller decides whether to retry. A save
//! at version zero is a guarded insert, so two writers racing to create the
//! same owner's document also resolve to one winner and one conflict.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::CartDocument;
use crate::domain::wishlist::WishlistDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document was modified concurrently")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A document plus the version it was loaded at. Version zero marks a
/// document that has never been persisted.
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: i64,
}

impl<T> Versioned<T> {
    pub fn new(doc: T) -> Self {
        Self { doc, version: 0 }
    }
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, owner_id: Uuid) -> Result<Option<Versioned<CartDocument>>, StoreError>;
    async fn save(&self, cart: &Versioned<CartDocument>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn load(&self, owner_id: Uuid)
        -> Result<Option<Versioned<WishlistDocument>>, StoreError>;
    async fn save(&self, wishlist: &Versioned<WishlistDocument>) -> Result<(), StoreError>;
}

#[derive(sqlx::FromRow)]
struct CartRow {
    data: Json<CartDocument>,
    version: i64,
}

pub struct PgCartStore {
    db: PgPool,
}

impl PgCartStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn load(&self, owner_id: Uuid) -> Result<Option<Versioned<CartDocument>>, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT data, version FROM carts WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| Versioned { doc: r.data.0, version: r.version }))
    }

    async fn save(&self, cart: &Versioned<CartDocument>) -> Result<(), StoreError> {
        let result = if cart.version == 0 {
            sqlx::query(
                "INSERT INTO carts (owner_id, data, version, created_at, updated_at) \
                 VALUES ($1, $2, 1, NOW(), NOW()) ON CONFLICT (owner_id) DO NOTHING",
            )
            .bind(cart.doc.owner_id())
            .bind(Json(&cart.doc))
            .execute(&self.db)
            .await?
        } else {
            sqlx::query(
                "UPDATE carts SET data = $2, version = version + 1, updated_at = NOW() \
                 WHERE owner_id = $1 AND version = $3",
            )
            .bind(cart.doc.owner_id())
            .bind(Json(&cart.doc))
            .bind(cart.version)
            .execute(&self.db)
            .await?
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct WishlistRow {
    data: Json<WishlistDocument>,
    version: i64,
}

pub struct PgWishlistStore {
    db: PgPool,
}

impl PgWishlistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WishlistStore for PgWishlistStore {
    async fn load(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<Versioned<WishlistDocument>>, StoreError> {
        let row = sqlx::query_as::<_, WishlistRow>(
            "SELECT data, version FROM wishlists WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| Versioned { doc: r.data.0, version: r.version }))
    }

    async fn save(&self, wishlist: &Versioned<WishlistDocument>) -> Result<(), StoreError> {
        let result = if wishlist.version == 0 {
            sqlx::query(
                "INSERT INTO wishlists (owner_id, data, version, created_at, updated_at) \
                 VALUES ($1, $2, 1, NOW(), NOW()) ON CONFLICT (owner_id) DO NOTHING",
            )
            .bind(wishlist.doc.owner_id())
            .bind(Json(&wishlist.doc))
            .execute(&self.db)
            .await?
        } else {
            sqlx::query(
                "UPDATE wishlists SET data = $2, version = version + 1, updated_at = NOW() \
                 WHERE owner_id = $1 AND version = $3",
            )
            .bind(wishlist.doc.owner_id())
            .bind(Json(&wishlist.doc))
            .bind(wishlist.version)
            .execute(&self.db)
            .await?
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}
