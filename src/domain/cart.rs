//! Cart document engine.
//!
//! One document per owner holds an ordered list of line items. A line is
//! identified by `(product_id, variant)`; a missing variant is a distinct
//! identity from any concrete label, including the empty string. Price,
//! name and image are snapshots captured when the line is first added and
//! are never refreshed afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartDocument {
    owner_id: Uuid,
    items: Vec<LineItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub name: String,
    pub image: Option<String>,
}

impl LineItem {
    pub fn matches(&self, product_id: Uuid, variant: Option<&str>) -> bool {
        self.product_id == product_id && self.variant.as_deref() == variant
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

impl CartDocument {
    pub fn empty(owner_id: Uuid) -> Self {
        Self { owner_id, items: vec![] }
    }

    pub fn owner_id(&self) -> Uuid { self.owner_id }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn find_line(&self, product_id: Uuid, variant: Option<&str>) -> Option<&LineItem> {
        self.items.iter().find(|i| i.matches(product_id, variant))
    }

    /// Merges the quantity into an existing line with the same identity, or
    /// appends the snapshot as a new line. Existing snapshots are kept.
    pub fn add_item(&mut self, snapshot: LineItem) -> Result<(), CartError> {
        if snapshot.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(snapshot.product_id, snapshot.variant.as_deref()))
        {
            existing.quantity = existing.quantity.saturating_add(snapshot.quantity);
        } else {
            self.items.push(snapshot);
        }
        Ok(())
    }

    /// Sets the quantity of an existing line. Zero is rejected; a line is
    /// only ever removed through [`CartDocument::remove_item`].
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let line = self
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant))
            .ok_or(CartError::ItemNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid, variant: Option<&str>) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, variant));
        if self.items.len() == before {
            return Err(CartError::ItemNotFound);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().fold(Decimal::ZERO, |acc, i| acc + i.line_total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, variant: Option<&str>, quantity: u32, price: Decimal) -> LineItem {
        LineItem {
            product_id,
            variant: variant.map(String::from),
            quantity,
            unit_price: price,
            name: "Replacement Screen".into(),
            image: Some("/images/screen.jpg".into()),
        }
    }

    #[test]
    fn add_merges_quantity_for_same_product_and_variant() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 2, Decimal::new(1099, 2))).unwrap();
        cart.add_item(line(pid, None, 3, Decimal::new(1099, 2))).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn merge_keeps_the_first_snapshot() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 1, Decimal::new(1000, 2))).unwrap();
        // The catalog price changed between adds; the stored line keeps the
        // value captured at first add.
        cart.add_item(line(pid, None, 1, Decimal::new(1250, 2))).unwrap();
        assert_eq!(cart.items()[0].unit_price, Decimal::new(1000, 2));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn variants_are_distinct_lines() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, Some("red"), 1, Decimal::ONE)).unwrap();
        cart.add_item(line(pid, Some("blue"), 2, Decimal::ONE)).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.find_line(pid, Some("red")).unwrap().quantity, 1);
        assert_eq!(cart.find_line(pid, Some("blue")).unwrap().quantity, 2);
    }

    #[test]
    fn missing_variant_is_not_the_empty_string() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 1, Decimal::ONE)).unwrap();
        cart.add_item(line(pid, Some(""), 1, Decimal::ONE)).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        let err = cart.add_item(line(pid, None, 0, Decimal::ONE)).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_rejects_zero_and_keeps_the_line() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 2, Decimal::ONE)).unwrap();
        let err = cart.update_quantity(pid, None, 0).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn update_quantity_requires_an_existing_line() {
        let mut cart = CartDocument::empty(Uuid::new_v4());
        let err = cart.update_quantity(Uuid::new_v4(), None, 3).unwrap_err();
        assert_eq!(err, CartError::ItemNotFound);
    }

    #[test]
    fn update_quantity_respects_variant_identity() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, Some("red"), 1, Decimal::ONE)).unwrap();
        let err = cart.update_quantity(pid, Some("blue"), 3).unwrap_err();
        assert_eq!(err, CartError::ItemNotFound);
        cart.update_quantity(pid, Some("red"), 3).unwrap();
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn remove_missing_line_fails_and_preserves_items() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 1, Decimal::ONE)).unwrap();
        let err = cart.remove_item(Uuid::new_v4(), None).unwrap_err();
        assert_eq!(err, CartError::ItemNotFound);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn remove_targets_only_the_matching_variant() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, Some("red"), 1, Decimal::ONE)).unwrap();
        cart.add_item(line(pid, Some("blue"), 1, Decimal::ONE)).unwrap();
        cart.remove_item(pid, Some("red")).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(cart.find_line(pid, Some("blue")).is_some());
    }

    #[test]
    fn clear_empties_and_is_idempotent() {
        let pid = Uuid::new_v4();
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(pid, None, 4, Decimal::ONE)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut cart = CartDocument::empty(Uuid::new_v4());
        cart.add_item(line(Uuid::new_v4(), None, 2, Decimal::new(1050, 2))).unwrap();
        cart.add_item(line(Uuid::new_v4(), None, 1, Decimal::new(499, 2))).unwrap();
        assert_eq!(cart.subtotal(), Decimal::new(2599, 2));
    }
}
