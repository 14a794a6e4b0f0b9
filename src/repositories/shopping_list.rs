//! The persisted shopping list under `shoppingList`.

use tracing::{error, warn};

use crate::domain::aggregates::{items_total, LineItem, Product};
use crate::domain::value_objects::{Money, ProductId};
use crate::storage::{keys, Storage, StorageError};
use crate::{Result, ValidationError};

#[derive(Clone, Debug)]
pub struct ShoppingListRepository {
    storage: Storage,
}

impl ShoppingListRepository {
    pub fn new(storage: Storage) -> Self { Self { storage } }

    pub async fn load(&self) -> Vec<LineItem> {
        match self.storage.read::<Vec<LineItem>>(keys::SHOPPING_LIST).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not load shopping list");
                Vec::new()
            }
        }
    }

    /// Puts `product` on the list at the typed price and quantity, replacing
    /// any line for the same product. Returns the updated list.
    pub async fn upsert(&self, product: &Product, price: &str, quantity: &str) -> Result<Vec<LineItem>> {
        let price = Money::parse(price)
            .filter(|p| *p > Money::ZERO)
            .ok_or_else(|| ValidationError::InvalidPrice(price.to_string()))?;
        let quantity = quantity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| ValidationError::InvalidQuantity(quantity.to_string()))?;

        let mut item = LineItem::from_product(product, quantity);
        item.price = price;
        let items = self
            .storage
            .update(keys::SHOPPING_LIST, |items: &mut Vec<LineItem>| {
                match items.iter_mut().find(|i| i.id == item.id) {
                    Some(existing) => *existing = item,
                    None => items.push(item),
                }
                items.clone()
            })
            .await?;
        Ok(items)
    }

    pub async fn remove(&self, id: ProductId) -> bool {
        let result = self
            .storage
            .update(keys::SHOPPING_LIST, |items: &mut Vec<LineItem>| items.retain(|i| i.id != id))
            .await;
        if let Err(e) = result {
            error!(error = %e, %id, "could not remove shopping list item");
            return false;
        }
        true
    }

    pub async fn try_clear(&self) -> std::result::Result<(), StorageError> {
        self.storage.remove(keys::SHOPPING_LIST).await
    }

    pub async fn clear(&self) -> bool {
        match self.try_clear().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "could not clear shopping list");
                false
            }
        }
    }

    pub fn total(items: &[LineItem]) -> Money { items_total(items) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FlakyStore;
    use crate::ShopError;

    fn cafe() -> Product {
        Product::new(ProductId::new(9), "Café", "alimentos", Money::from_cents(1590), "")
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_line() {
        let list = ShoppingListRepository::new(Storage::in_memory());
        list.upsert(&cafe(), "15.90", "1").await.unwrap();
        let items = list.upsert(&cafe(), "14,50", "3").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Money::from_cents(1450));
        assert_eq!(items[0].quantity, 3);
        assert_eq!(list.load().await, items);
        assert_eq!(ShoppingListRepository::total(&items), Money::from_cents(4350));
    }

    #[tokio::test]
    async fn test_upsert_validation() {
        let store = FlakyStore::new();
        let list = ShoppingListRepository::new(Storage::from_arc(store.clone()));
        for (price, quantity) in [
            ("0", "1"),
            ("abc", "1"),
            ("-3", "1"),
            ("1000000000.01", "1"),
            ("2.999", "1"),
            ("2", "0"),
            ("2", "x"),
            ("2", "-1"),
        ] {
            let err = list.upsert(&cafe(), price, quantity).await.unwrap_err();
            assert!(matches!(err, ShopError::Validation(_)), "{price}/{quantity}");
        }
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let list = ShoppingListRepository::new(Storage::in_memory());
        let leite = Product::new(ProductId::new(3), "Leite", "laticínios", Money::from_cents(499), "");
        list.upsert(&cafe(), "15.90", "1").await.unwrap();
        list.upsert(&leite, "4.99", "6").await.unwrap();

        assert!(list.remove(cafe().id).await);
        assert_eq!(list.load().await.len(), 1);
        assert!(list.clear().await);
        assert!(list.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failures_report_false() {
        let store = FlakyStore::new();
        let list = ShoppingListRepository::new(Storage::from_arc(store.clone()));
        list.upsert(&cafe(), "15.90", "1").await.unwrap();
        store.fail_writes(true);
        assert!(!list.remove(cafe().id).await);
        assert!(!list.clear().await);
        assert!(matches!(list.upsert(&cafe(), "1", "1").await, Err(ShopError::Storage(_))));
        store.fail_writes(false);
        assert_eq!(list.load().await.len(), 1);
    }
}
