//! Engine services: orchestration of the document engines with their
//! catalog and store collaborators, serialized per owner.

pub mod cart;
pub mod wishlist;

pub use cart::CartService;
pub use wishlist::WishlistService;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// One async mutex per owner. Every load-mutate-save sequence for an owner
/// runs under that owner's lock; different owners proceed in parallel.
/// Entries are one pointer each and are kept for the life of the process.
#[derive(Default)]
pub(crate) struct OwnerLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl OwnerLocks {
    pub(crate) fn lock_for(&self, owner_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(owner_id).or_default().clone()
    }
}
