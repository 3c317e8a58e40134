//! Wishlist document engine.
//!
//! Same document shape as the cart, keyed by product alone: a product is
//! either listed or not, there are no quantities and no price snapshots.
//! Product details are joined live when the list is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WishlistDocument {
    owner_id: Uuid,
    entries: Vec<WishlistEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product_id: Uuid,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WishlistError {
    #[error("Product already in wishlist")]
    AlreadyListed,
    #[error("Product not in wishlist")]
    NotListed,
}

impl WishlistDocument {
    pub fn empty(owner_id: Uuid) -> Self {
        Self { owner_id, entries: vec![] }
    }

    pub fn owner_id(&self) -> Uuid { self.owner_id }
    pub fn entries(&self) -> &[WishlistEntry] { &self.entries }
    pub fn entry_count(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.entries.iter().any(|e| e.product_id == product_id)
    }

    pub fn add(&mut self, product_id: Uuid) -> Result<(), WishlistError> {
        if self.contains(product_id) {
            return Err(WishlistError::AlreadyListed);
        }
        self.entries.push(WishlistEntry { product_id, added_at: Utc::now() });
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) -> Result<(), WishlistError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        if self.entries.len() == before {
            return Err(WishlistError::NotListed);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_add_is_rejected() {
        let pid = Uuid::new_v4();
        let mut wishlist = WishlistDocument::empty(Uuid::new_v4());
        wishlist.add(pid).unwrap();
        assert_eq!(wishlist.add(pid), Err(WishlistError::AlreadyListed));
        assert_eq!(wishlist.entry_count(), 1);
    }

    #[test]
    fn remove_missing_product_fails() {
        let mut wishlist = WishlistDocument::empty(Uuid::new_v4());
        wishlist.add(Uuid::new_v4()).unwrap();
        assert_eq!(wishlist.remove(Uuid::new_v4()), Err(WishlistError::NotListed));
        assert_eq!(wishlist.entry_count(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut wishlist = WishlistDocument::empty(Uuid::new_v4());
        wishlist.add(Uuid::new_v4()).unwrap();
        wishlist.clear();
        assert!(wishlist.is_empty());
        wishlist.clear();
        assert!(wishlist.is_empty());
    }
}
