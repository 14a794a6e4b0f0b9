//! Product catalog under the `products` key.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::domain::aggregates::{Product, ProductDraft};
use crate::domain::value_objects::{Money, ProductId};
use crate::storage::{keys, Storage};
use crate::Result;

#[derive(Clone, Debug)]
pub struct CatalogRepository {
    storage: Storage,
}

impl CatalogRepository {
    pub fn new(storage: Storage) -> Self { Self { storage } }

    /// Current catalog; empty when nothing is stored or the blob is unreadable.
    pub async fn list_products(&self) -> Vec<Product> {
        match self.storage.read::<Vec<Product>>(keys::PRODUCTS).await {
            Ok(products) => products.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not load products");
                Vec::new()
            }
        }
    }

    pub async fn find_product(&self, id: ProductId) -> Option<Product> {
        self.list_products().await.into_iter().find(|p| p.id == id)
    }

    /// Distinct categories in catalog order.
    pub async fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for product in self.list_products().await {
            if !categories.contains(&product.category) {
                categories.push(product.category);
            }
        }
        categories
    }

    /// Products in `category`; `"all"` matches everything.
    pub async fn products_in_category(&self, category: &str) -> Vec<Product> {
        self.list_products().await.into_iter().filter(|p| p.in_category(category)).collect()
    }

    /// Validates `draft` and appends it under a fresh id.
    ///
    /// The id is the current time in milliseconds, bumped past the largest
    /// stored id if needed so it never collides.
    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product> {
        let mut product = draft.into_product(ProductId::new(Utc::now().timestamp_millis()))?;
        let product = self
            .storage
            .update(keys::PRODUCTS, |products: &mut Vec<Product>| {
                product.id = next_product_id(products, product.id);
                products.push(product.clone());
                product
            })
            .await?;
        info!(id = %product.id, name = %product.name, "product added");
        Ok(product)
    }

    /// Whether a product was removed. Carts and history keep their copies.
    pub async fn delete_product(&self, id: ProductId) -> bool {
        let result = self
            .storage
            .update(keys::PRODUCTS, |products: &mut Vec<Product>| {
                let before = products.len();
                products.retain(|p| p.id != id);
                products.len() != before
            })
            .await;
        match result {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, %id, "could not delete product");
                false
            }
        }
    }

    /// Stores the sample grocery catalog if no catalog has been saved yet.
    /// Returns whether anything was written.
    pub async fn seed_defaults(&self) -> bool {
        let result = self
            .storage
            .update(keys::PRODUCTS, |slot: &mut Option<Vec<Product>>| {
                if slot.is_some() { return false; }
                *slot = Some(sample_products());
                true
            })
            .await;
        match result {
            Ok(seeded) => {
                if seeded { info!("seeded sample catalog"); }
                seeded
            }
            Err(e) => {
                error!(error = %e, "could not seed catalog");
                false
            }
        }
    }
}

/// `candidate` unless a stored id is at or above it, then the largest id + 1.
/// When that would overflow, the smallest positive id not in use.
fn next_product_id(products: &[Product], candidate: ProductId) -> ProductId {
    let Some(max) = products.iter().map(|p| p.id.as_i64()).max() else { return candidate };
    if max < candidate.as_i64() {
        return candidate;
    }
    if let Some(next) = max.checked_add(1) {
        return ProductId::new(next);
    }
    let taken: HashSet<i64> = products.iter().map(|p| p.id.as_i64()).collect();
    (1..=i64::MAX).find(|id| !taken.contains(id)).map_or(candidate, ProductId::new)
}

/// The starter catalog shipped with the app.
pub fn sample_products() -> Vec<Product> {
    [
        (1, "Arroz", "alimentos", 2290, "Arroz branco tipo 1, pacote de 5kg."),
        (2, "Feijão", "alimentos", 850, "Feijão carioca tipo 1, pacote de 1kg."),
        (3, "Leite", "laticínios", 499, "Leite integral UHT, embalagem de 1 litro."),
        (4, "Pão", "padaria", 799, "Pão francês fresco, pacote com 10 unidades."),
        (5, "Maçã", "frutas", 890, "Maçã vermelha, pacote com 1kg."),
        (6, "Sabonete", "higiene", 250, "Sabonete em barra, 90g."),
        (7, "Detergente", "limpeza", 320, "Detergente líquido, 500ml."),
        (8, "Papel Higiênico", "higiene", 1890, "Papel higiênico folha dupla, pacote com 12 rolos."),
        (9, "Café", "alimentos", 1590, "Café torrado e moído, pacote de 500g."),
        (10, "Açúcar", "alimentos", 499, "Açúcar refinado, pacote de 1kg."),
    ]
    .into_iter()
    .map(|(id, name, category, cents, description)| {
        Product::new(ProductId::new(id), name, category, Money::from_cents(cents), description)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FlakyStore;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::{ShopError, ValidationError};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_catalog() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        assert!(catalog.list_products().await.is_empty());
        assert!(catalog.categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_and_delete() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        let arroz = catalog.add_product(ProductDraft::new("Arroz", "22.90").category("alimentos")).await.unwrap();
        let sabao = catalog.add_product(ProductDraft::new("Sabão", "3")).await.unwrap();
        assert_ne!(arroz.id, sabao.id);
        assert_eq!(sabao.category, "outros");
        assert_eq!(catalog.list_products().await, vec![arroz.clone(), sabao.clone()]);

        assert!(catalog.delete_product(arroz.id).await);
        assert!(!catalog.delete_product(arroz.id).await);
        assert_eq!(catalog.list_products().await, vec![sabao]);
    }

    #[tokio::test]
    async fn test_ids_never_collide() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        let mut ids = Vec::new();
        for i in 0..25 {
            ids.push(catalog.add_product(ProductDraft::new(format!("P{i}"), "1")).await.unwrap().id);
        }
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_id_after_the_largest_possible_id() {
        let store = Arc::new(MemoryStore::new());
        let legacy = format!(r#"[{{"id":{},"name":"A","price":1}},{{"id":1,"name":"B","price":2}}]"#, i64::MAX);
        store.set(keys::PRODUCTS, legacy).await.unwrap();
        let catalog = CatalogRepository::new(Storage::from_arc(store));

        let c = catalog.add_product(ProductDraft::new("C", "1")).await.unwrap();
        assert_eq!(c.id, ProductId::new(2));
        let d = catalog.add_product(ProductDraft::new("D", "1")).await.unwrap();
        assert_eq!(d.id, ProductId::new(3));
        assert_eq!(catalog.list_products().await.len(), 4);
    }

    #[tokio::test]
    async fn test_boundary_price_reloads_exactly() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        let ouro = catalog.add_product(ProductDraft::new("Ouro", "999999999.99")).await.unwrap();
        let cafe = catalog.add_product(ProductDraft::new("Café", "15,9")).await.unwrap();
        assert_eq!(catalog.list_products().await, vec![ouro.clone(), cafe]);
        assert_eq!(ouro.price, Money::from_cents(99_999_999_999));

        let err = catalog.add_product(ProductDraft::new("Ouro", "79228162514264337593543950335")).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation(ValidationError::InvalidPrice(_))));
        assert!(catalog.add_product(ProductDraft::new("Pão", "1")).await.is_ok());
        assert_eq!(catalog.list_products().await.len(), 3);
    }

    #[tokio::test]
    async fn test_unchanged_catalog_is_not_rewritten() {
        let store = FlakyStore::new();
        let catalog = CatalogRepository::new(Storage::from_arc(store.clone()));
        assert!(catalog.seed_defaults().await);
        assert_eq!(store.writes(), 1);
        assert!(!catalog.seed_defaults().await);
        assert!(!catalog.delete_product(ProductId::new(404)).await);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_persisted() {
        let store = FlakyStore::new();
        let catalog = CatalogRepository::new(Storage::from_arc(store.clone()));
        let err = catalog.add_product(ProductDraft::new("", "1")).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation(ValidationError::MissingProductName)));
        let err = catalog.add_product(ProductDraft::new("Leite", "")).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation(ValidationError::InvalidPrice(_))));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_blob_degrades_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::PRODUCTS, "[{\"id\":".into()).await.unwrap();
        let catalog = CatalogRepository::new(Storage::from_arc(store.clone()));
        assert!(catalog.list_products().await.is_empty());
        assert!(catalog.add_product(ProductDraft::new("Leite", "4.99")).await.is_err());
        assert!(!catalog.delete_product(ProductId::new(1)).await);
    }

    #[tokio::test]
    async fn test_seed_only_once() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        assert!(catalog.seed_defaults().await);
        assert!(!catalog.seed_defaults().await);
        assert_eq!(catalog.list_products().await.len(), 10);
        assert_eq!(
            catalog.categories().await,
            vec!["alimentos", "laticínios", "padaria", "frutas", "higiene", "limpeza"]
        );
        assert_eq!(catalog.products_in_category("higiene").await.len(), 2);
        assert_eq!(catalog.products_in_category("all").await.len(), 10);
        assert_eq!(catalog.find_product(ProductId::new(9)).await.unwrap().name, "Café");
    }

    #[tokio::test]
    async fn test_seed_keeps_an_emptied_catalog() {
        let catalog = CatalogRepository::new(Storage::in_memory());
        let p = catalog.add_product(ProductDraft::new("Leite", "4.99")).await.unwrap();
        catalog.delete_product(p.id).await;
        assert!(!catalog.seed_defaults().await);
        assert!(catalog.list_products().await.is_empty());
    }
}
