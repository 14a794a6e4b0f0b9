//! Cart Aggregate

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::product::{Product, DEFAULT_CATEGORY};
use crate::domain::aggregates::purchase::NewPurchase;
use crate::domain::value_objects::{Money, ProductId};

/// A product copied into a cart, shopping list or purchase, plus a quantity.
///
/// Never shares data with the catalog: later catalog edits do not reach
/// items already added. Decoding treats a missing or zero quantity as 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredLineItem")]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub description: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            description: product.description.clone(),
            quantity: quantity.max(1),
        }
    }

    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

#[derive(Deserialize)]
struct StoredLineItem {
    id: ProductId,
    name: String,
    #[serde(default)]
    category: String,
    price: Money,
    #[serde(default)]
    description: String,
    #[serde(default)]
    quantity: Option<u32>,
}

impl From<StoredLineItem> for LineItem {
    fn from(s: StoredLineItem) -> Self {
        let category = if s.category.trim().is_empty() { DEFAULT_CATEGORY.to_string() } else { s.category };
        let description = if s.description.trim().is_empty() { s.name.clone() } else { s.description };
        Self {
            id: s.id,
            name: s.name,
            category,
            price: s.price,
            description,
            quantity: s.quantity.unwrap_or(1).max(1),
        }
    }
}

/// Σ price × quantity.
pub fn items_total(items: &[LineItem]) -> Money { items.iter().map(LineItem::line_total).sum() }

/// The in-memory cart. Lives for one session and is never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn get(&self, id: ProductId) -> Option<&LineItem> { self.items.iter().find(|i| i.id == id) }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    /// Distinct lines.
    pub fn item_count(&self) -> usize { self.items.len() }
    /// Units across all lines.
    pub fn unit_count(&self) -> u32 { self.items.iter().fold(0, |n, i| n.saturating_add(i.quantity)) }

    /// Adds one unit, merging into an existing line without reordering.
    pub fn add_to_cart(&mut self, product: &Product) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(LineItem::from_product(product, 1));
        }
    }

    /// Returns whether a line was removed.
    pub fn remove_from_cart(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Sets a line's quantity; zero or below removes the line. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total(&self) -> Money { items_total(&self.items) }

    /// Deep copy of the cart as a purchase to be finalized, or `None` when empty.
    pub fn snapshot(&self, title: &str) -> Option<NewPurchase> {
        if self.is_empty() { return None; }
        Some(NewPurchase::new(title, self.items.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(id: i64, cents: i64) -> Product {
        Product::new(ProductId::new(id), format!("P{id}"), "alimentos", Money::from_cents(cents), "")
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(1, 1000));
        cart.add_to_cart(&product(2, 500));
        cart.add_to_cart(&product(1, 1000));
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.unit_count(), 3);
        assert_eq!(cart.items()[0].id, ProductId::new(1)); // Merged in place
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), Money::from_cents(2500));
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let mut cart = Cart::new();
        let p = product(9, 199);
        for _ in 0..7 { cart.add_to_cart(&p); }
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.get(p.id).unwrap().quantity, 7);
    }

    #[test]
    fn test_total_is_order_independent() {
        let products = [product(1, 1000), product(2, 333), product(3, 1)];
        let mut forward = Cart::new();
        let mut backward = Cart::new();
        for p in &products { forward.add_to_cart(p); forward.add_to_cart(p); }
        for p in products.iter().rev() { backward.add_to_cart(p); backward.add_to_cart(p); }
        assert_eq!(forward.total(), backward.total());
    }

    #[test]
    fn test_update_quantity_zero_is_remove() {
        let mut by_update = Cart::new();
        by_update.add_to_cart(&product(1, 1000));
        by_update.add_to_cart(&product(2, 500));
        let mut by_remove = by_update.clone();

        by_update.update_quantity(ProductId::new(1), 0);
        by_remove.remove_from_cart(ProductId::new(1));
        assert_eq!(by_update, by_remove);

        by_update.update_quantity(ProductId::new(2), -3);
        assert!(by_update.is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(1, 1000));
        cart.update_quantity(ProductId::new(42), 5);
        assert!(!cart.remove_from_cart(ProductId::new(42)));
        cart.update_quantity(ProductId::new(1), 4);
        assert_eq!(cart.total(), Money::from_cents(4000));
    }

    #[test]
    fn test_items_are_copies() {
        let mut p = product(1, 1000);
        let mut cart = Cart::new();
        cart.add_to_cart(&p);
        p.price = Money::from_cents(1);
        p.name = "changed".into();
        assert_eq!(cart.items()[0].price, Money::from_cents(1000));
        assert_eq!(cart.items()[0].name, "P1");
    }

    #[test]
    fn test_snapshot() {
        let mut cart = Cart::new();
        assert!(cart.snapshot("x").is_none());
        cart.add_to_cart(&product(1, 1000));
        let purchase = cart.snapshot("  ").unwrap();
        assert_eq!(purchase.title, "Compra");
        assert_eq!(purchase.total, Money::from_cents(1000));
        assert_eq!(purchase.items, cart.items());
    }

    #[test]
    fn test_totals_at_the_limits() {
        let mut cart = Cart::new();
        let mut dear = product(1, 0);
        dear.price = Money::MAX_INPUT;
        cart.add_to_cart(&dear);
        cart.update_quantity(dear.id, i64::MAX);
        assert_eq!(cart.unit_count(), u32::MAX);
        assert_eq!(cart.total(), Money::MAX_INPUT.multiply(u32::MAX));

        let mut ouro = product(2, 0);
        ouro.price = Money::new(Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0));
        let mut cart = Cart::new();
        cart.add_to_cart(&ouro);
        cart.add_to_cart(&ouro);
        assert_eq!(cart.total(), Money::new(Decimal::MAX));
        ouro.id = ProductId::new(3);
        cart.add_to_cart(&ouro);
        assert_eq!(cart.total(), Money::new(Decimal::MAX));
        assert_eq!(cart.unit_count(), 3);
    }

    #[test]
    fn test_line_item_decode_defaults() {
        let item: LineItem = serde_json::from_str(r#"{"id":1,"name":"Pão","price":7.99,"quantity":0}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.category, "outros");
        let item: LineItem = serde_json::from_str(r#"{"id":1,"name":"Pão","price":7.99}"#).unwrap();
        assert_eq!(item.line_total(), Money::from_cents(799));
    }
}
