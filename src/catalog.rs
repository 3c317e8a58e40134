//! Product catalog lookups used by the cart and wishlist engines.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// The slice of a product the engines care about: identity plus the fields
/// that get snapshotted into cart lines.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product(&self, id: Uuid) -> Result<Option<ProductSummary>, CatalogError>;
}

pub struct PgCatalog {
    db: PgPool,
}

impl PgCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductCatalog for PgCatalog {
    async fn find_product(&self, id: Uuid) -> Result<Option<ProductSummary>, CatalogError> {
        let product = sqlx::query_as::<_, ProductSummary>(
            "SELECT p.id, p.name, p.price, \
             (SELECT url FROM product_images WHERE product_id = p.id ORDER BY position, created_at LIMIT 1) AS image \
             FROM products p WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }
}
