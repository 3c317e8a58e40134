//! Wishlist engine service.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::domain::wishlist::WishlistDocument;
use crate::error::{ApiError, ApiResult};
use crate::store::{Versioned, WishlistStore};

use super::OwnerLocks;

#[derive(Clone)]
pub struct WishlistService {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn WishlistStore>,
    locks: Arc<OwnerLocks>,
}

impl WishlistService {
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn WishlistStore>) -> Self {
        Self { catalog, store, locks: Arc::new(OwnerLocks::default()) }
    }

    pub async fn get_wishlist(&self, owner_id: Uuid) -> ApiResult<WishlistDocument> {
        let wishlist = self.store.load(owner_id).await?;
        Ok(wishlist.map(|w| w.doc).unwrap_or_else(|| WishlistDocument::empty(owner_id)))
    }

    pub async fn add_product(&self, owner_id: Uuid, product_id: Uuid) -> ApiResult<WishlistDocument> {
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        if self.catalog.find_product(product_id).await?.is_none() {
            return Err(ApiError::NotFound("Product not found".into()));
        }

        let mut wishlist = self.load_versioned(owner_id).await?;
        wishlist.doc.add(product_id)?;
        self.store.save(&wishlist).await?;
        Ok(wishlist.doc)
    }

    pub async fn remove_product(&self, owner_id: Uuid, product_id: Uuid) -> ApiResult<WishlistDocument> {
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let mut wishlist = self.load_versioned(owner_id).await?;
        wishlist.doc.remove(product_id)?;
        self.store.save(&wishlist).await?;
        Ok(wishlist.doc)
    }

    /// Empties the wishlist. Succeeds for owners that never had one.
    pub async fn clear_wishlist(&self, owner_id: Uuid) -> ApiResult<WishlistDocument> {
        let lock = self.locks.lock_for(owner_id);
        let _guard = lock.lock().await;

        let mut wishlist = self.load_versioned(owner_id).await?;
        wishlist.doc.clear();
        self.store.save(&wishlist).await?;
        Ok(wishlist.doc)
    }

    async fn load_versioned(&self, owner_id: Uuid) -> ApiResult<Versioned<WishlistDocument>> {
        Ok(self
            .store
            .load(owner_id)
            .await?
            .unwrap_or_else(|| Versioned::new(WishlistDocument::empty(owner_id))))
    }
}
