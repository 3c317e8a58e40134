//! Integration tests for the cart and wishlist engines over in-memory
//! collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use repairhub::catalog::{CatalogError, ProductCatalog, ProductSummary};
use repairhub::domain::cart::CartDocument;
use repairhub::domain::wishlist::WishlistDocument;
use repairhub::error::ApiError;
use repairhub::service::{CartService, WishlistService};
use repairhub::store::{CartStore, StoreError, Versioned, WishlistStore};

#[derive(Default)]
struct MemoryCatalog {
    products: Mutex<HashMap<Uuid, ProductSummary>>,
}

impl MemoryCatalog {
    fn insert(&self, name: &str, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.products
            .lock()
            .unwrap()
            .insert(id, ProductSummary { id, name: name.into(), price, image: None });
        id
    }

    fn set_price(&self, id: Uuid, price: Decimal) {
        if let Some(product) = self.products.lock().unwrap().get_mut(&id) {
            product.price = price;
        }
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_product(&self, id: Uuid) -> Result<Option<ProductSummary>, CatalogError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
struct MemoryCartStore {
    rows: Mutex<HashMap<Uuid, (CartDocument, i64)>>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load(&self, owner_id: Uuid) -> Result<Option<Versioned<CartDocument>>, StoreError> {
        // Widen the load-save window so unserialized interleavings would
        // actually collide in the concurrency tests.
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&owner_id)
            .map(|(doc, version)| Versioned { doc: doc.clone(), version: *version }))
    }

    async fn save(&self, cart: &Versioned<CartDocument>) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let current = rows.get(&cart.doc.owner_id()).map(|(_, v)| *v).unwrap_or(0);
        if current != cart.version {
            return Err(StoreError::Conflict);
        }
        rows.insert(cart.doc.owner_id(), (cart.doc.clone(), cart.version + 1));
        Ok(())
    }
}

/// A store whose every save loses the version race.
struct ConflictingCartStore;

#[async_trait]
impl CartStore for ConflictingCartStore {
    async fn load(&self, _owner_id: Uuid) -> Result<Option<Versioned<CartDocument>>, StoreError> {
        Ok(None)
    }

    async fn save(&self, _cart: &Versioned<CartDocument>) -> Result<(), StoreError> {
        Err(StoreError::Conflict)
    }
}

#[derive(Default)]
struct MemoryWishlistStore {
    rows: Mutex<HashMap<Uuid, (WishlistDocument, i64)>>,
}

#[async_trait]
impl WishlistStore for MemoryWishlistStore {
    async fn load(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<Versioned<WishlistDocument>>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&owner_id)
            .map(|(doc, version)| Versioned { doc: doc.clone(), version: *version }))
    }

    async fn save(&self, wishlist: &Versioned<WishlistDocument>) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let current = rows.get(&wishlist.doc.owner_id()).map(|(_, v)| *v).unwrap_or(0);
        if current != wishlist.version {
            return Err(StoreError::Conflict);
        }
        rows.insert(wishlist.doc.owner_id(), (wishlist.doc.clone(), wishlist.version + 1));
        Ok(())
    }
}

fn cart_service() -> (CartService, Arc<MemoryCatalog>) {
    let catalog = Arc::new(MemoryCatalog::default());
    let service = CartService::new(catalog.clone(), Arc::new(MemoryCartStore::default()));
    (service, catalog)
}

fn wishlist_service() -> (WishlistService, Arc<MemoryCatalog>) {
    let catalog = Arc::new(MemoryCatalog::default());
    let service = WishlistService::new(catalog.clone(), Arc::new(MemoryWishlistStore::default()));
    (service, catalog)
}

// -----------------------------------------------------------------------
// Cart engine
// -----------------------------------------------------------------------

#[tokio::test]
async fn fresh_owner_gets_an_empty_cart_without_persisting() {
    let (service, _) = cart_service();
    let owner = Uuid::new_v4();
    let cart = service.get_cart(owner).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.owner_id(), owner);
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_quantities() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));

    service.add_item(owner, screen, 2, None).await.unwrap();
    let cart = service.add_item(owner, screen, 3, None).await.unwrap();

    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.items()[0].quantity, 5);
}

#[tokio::test]
async fn variants_of_one_product_stay_separate_lines() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let case = catalog.insert("Phone Case", Decimal::new(1500, 2));

    service.add_item(owner, case, 1, Some("red".into())).await.unwrap();
    let cart = service.add_item(owner, case, 1, Some("blue".into())).await.unwrap();

    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.find_line(case, Some("red")).unwrap().quantity, 1);
    assert_eq!(cart.find_line(case, Some("blue")).unwrap().quantity, 1);
}

#[tokio::test]
async fn add_rejects_unknown_products() {
    let (service, _) = cart_service();
    let owner = Uuid::new_v4();

    let err = service.add_item(owner, Uuid::new_v4(), 1, None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "expected NotFound, got {err:?}");
    assert!(service.get_cart(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_rejects_non_positive_quantities() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let battery = catalog.insert("Battery", Decimal::new(2500, 2));

    for quantity in [0, -3] {
        let err = service.add_item(owner, battery, quantity, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "expected Validation, got {err:?}");
    }
    assert!(service.get_cart(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn quantity_update_to_zero_is_rejected_and_the_line_survives() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let battery = catalog.insert("Battery", Decimal::new(2500, 2));

    service.add_item(owner, battery, 2, None).await.unwrap();
    let err = service.update_item_quantity(owner, battery, 0, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)), "expected Validation, got {err:?}");

    let cart = service.get_cart(owner).await.unwrap();
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn quantity_update_requires_an_existing_line() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let battery = catalog.insert("Battery", Decimal::new(2500, 2));

    let err = service.update_item_quantity(owner, battery, 3, None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "expected NotFound, got {err:?}");
}

#[tokio::test]
async fn removing_a_missing_line_fails_and_changes_nothing() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));

    service.add_item(owner, screen, 1, None).await.unwrap();
    let err = service.remove_item(owner, Uuid::new_v4(), None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "expected NotFound, got {err:?}");

    let cart = service.get_cart(owner).await.unwrap();
    assert_eq!(cart.item_count(), 1);
}

#[tokio::test]
async fn remove_honours_the_variant_identity() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let case = catalog.insert("Phone Case", Decimal::new(1500, 2));

    service.add_item(owner, case, 1, Some("red".into())).await.unwrap();
    // Plain and empty-string variants are different identities from "red".
    let err = service.remove_item(owner, case, None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    let err = service.remove_item(owner, case, Some("")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let cart = service.remove_item(owner, case, Some("red")).await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn clear_succeeds_repeatedly_even_for_a_fresh_owner() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();

    let cart = service.clear_cart(owner).await.unwrap();
    assert!(cart.is_empty());

    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));
    service.add_item(owner, screen, 4, None).await.unwrap();
    let cart = service.clear_cart(owner).await.unwrap();
    assert!(cart.is_empty());
    let cart = service.clear_cart(owner).await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn snapshots_do_not_follow_catalog_price_changes() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let screen = catalog.insert("Replacement Screen", Decimal::new(1000, 2));

    service.add_item(owner, screen, 1, None).await.unwrap();
    catalog.set_price(screen, Decimal::new(1250, 2));

    // Reads return the stored snapshot and a merge keeps it too.
    let cart = service.get_cart(owner).await.unwrap();
    assert_eq!(cart.items()[0].unit_price, Decimal::new(1000, 2));
    let cart = service.add_item(owner, screen, 1, None).await.unwrap();
    assert_eq!(cart.items()[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn owners_have_independent_carts() {
    let (service, catalog) = cart_service();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));

    service.add_item(alice, screen, 1, None).await.unwrap();
    service.add_item(bob, screen, 5, None).await.unwrap();

    assert_eq!(service.get_cart(alice).await.unwrap().items()[0].quantity, 1);
    assert_eq!(service.get_cart(bob).await.unwrap().items()[0].quantity, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_one_owner_both_land() {
    let (service, catalog) = cart_service();
    let owner = Uuid::new_v4();
    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));

    let a = {
        let service = service.clone();
        tokio::spawn(async move { service.add_item(owner, screen, 1, None).await })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move { service.add_item(owner, screen, 1, None).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let cart = service.get_cart(owner).await.unwrap();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn a_lost_version_race_surfaces_as_conflict() {
    let catalog = Arc::new(MemoryCatalog::default());
    let screen = catalog.insert("Replacement Screen", Decimal::new(4999, 2));
    let service = CartService::new(catalog, Arc::new(ConflictingCartStore));

    let err = service.add_item(Uuid::new_v4(), screen, 1, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)), "expected Conflict, got {err:?}");
}

// -----------------------------------------------------------------------
// Wishlist engine
// -----------------------------------------------------------------------

#[tokio::test]
async fn wishlist_rejects_duplicates_and_unknown_products() {
    let (service, catalog) = wishlist_service();
    let owner = Uuid::new_v4();
    let case = catalog.insert("Phone Case", Decimal::new(1500, 2));

    service.add_product(owner, case).await.unwrap();
    let err = service.add_product(owner, case).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)), "expected Validation, got {err:?}");

    let err = service.add_product(owner, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "expected NotFound, got {err:?}");

    assert_eq!(service.get_wishlist(owner).await.unwrap().entry_count(), 1);
}

#[tokio::test]
async fn wishlist_remove_of_an_unlisted_product_fails_loud() {
    let (service, catalog) = wishlist_service();
    let owner = Uuid::new_v4();
    let case = catalog.insert("Phone Case", Decimal::new(1500, 2));

    service.add_product(owner, case).await.unwrap();
    let err = service.remove_product(owner, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(service.get_wishlist(owner).await.unwrap().entry_count(), 1);

    let wishlist = service.remove_product(owner, case).await.unwrap();
    assert!(wishlist.is_empty());
}

#[tokio::test]
async fn wishlist_clear_is_idempotent() {
    let (service, catalog) = wishlist_service();
    let owner = Uuid::new_v4();
    let case = catalog.insert("Phone Case", Decimal::new(1500, 2));

    service.add_product(owner, case).await.unwrap();
    assert!(service.clear_wishlist(owner).await.unwrap().is_empty());
    assert!(service.clear_wishlist(owner).await.unwrap().is_empty());
}
