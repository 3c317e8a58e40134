//! Cart engine service.
//!
//! Validates quantities, resolves products through the catalog, captures
//! snapshots and persists with compare-and-swap. A version conflict is
//! returned to the caller as-is; the service never retries on its own.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::domain::cart::{CartDocument, LineItem};
use crate::error::{ApiError, ApiResult};
use crate::store::{CartStore, Versioned};

use super::OwnerLocks;

#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn CartStore>,
    locks: Arc<OwnerLocks>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn CartStore>) -> Self {
        Self { catalog, store, locks: Arc::new(OwnerLocks::default()) }
    }

    /// Returns the owner's cart. An owner that never touched their cart gets
    /// an empty document; nothing is persisted by a read.
    pub async fn get_cart(&self, owner_id: Uuid) -> ApiResult<CartDocument> {
        let cart = self.store.load(owner_id).await?;
        Ok(cart.map(|c| c.doc).unwrap_or_else(|| CartDocument::empty(owner_id)))
    }

    pub async fn add_item(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        variant: Option<String>,
    ) -> ApiResult<CartDocument> {
        let quantity = validate_quantity(quantity)?;
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let product = self
            .catalog
            .find_product(product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

        let mut cart = self.load_versioned(owner_id).await?;
        cart.doc.add_item(LineItem {
            product_id: product.id,
            variant,
            quantity,
            unit_price: product.price,
            name: product.name,
            image: product.image,
        })?;
        self.store.save(&cart).await?;
        Ok(cart.doc)
    }

    pub async fn update_item_quantity(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        variant: Option<&str>,
    ) -> ApiResult<CartDocument> {
        let quantity = validate_quantity(quantity)?;
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let mut cart = self.load_versioned(owner_id).await?;
        cart.doc.update_quantity(product_id, variant, quantity)?;
        self.store.save(&cart).await?;
        Ok(cart.doc)
    }

    pub async fn remove_item(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        variant: Option<&str>,
    ) -> ApiResult<CartDocument> {
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let mut cart = self.load_versioned(owner_id).await?;
        cart.doc.remove_item(product_id, variant)?;
        self.store.save(&cart).await?;
        Ok(cart.doc)
    }

    /// Empties the cart. Succeeds for owners that never had one.
    pub async fn clear_cart(&self, owner_id: Uuid) -> ApiResult<CartDocument> {
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let mut cart = self.load_versioned(owner_id).await?;
        cart.doc.clear();
        self.store.save(&cart).await?;
        Ok(cart.doc)
    }

    async fn load_versioned(&self, owner_id: Uuid) -> ApiResult<Versioned<CartDocument>> {
        Ok(self
            .store
            .load(owner_id)
            .await?
            .unwrap_or_else(|| Versioned::new(CartDocument::empty(owner_id))))
    }
}

fn validate_quantity(quantity: i64) -> ApiResult<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| ApiError::Validation("Quantity must be at least 1".into()))
}
