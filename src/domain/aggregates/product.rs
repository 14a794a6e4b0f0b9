//! Product Aggregate

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Money, ProductId};
use crate::ValidationError;

pub const DEFAULT_CATEGORY: &str = "outros";

/// A catalog entry.
///
/// Blobs written by older builds may omit `category` or `description`; the
/// defaults are filled in once while decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredProduct")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub description: String,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, category: &str, price: Money, description: &str) -> Self {
        let name = name.into();
        Self {
            id,
            category: non_blank_or(category, DEFAULT_CATEGORY),
            description: non_blank_or(description, &name),
            name,
            price,
        }
    }

    pub fn in_category(&self, category: &str) -> bool {
        category == "all" || self.category.eq_ignore_ascii_case(category)
    }
}

#[derive(Deserialize)]
struct StoredProduct {
    id: ProductId,
    name: String,
    #[serde(default)]
    category: String,
    price: Money,
    #[serde(default)]
    description: String,
}

impl From<StoredProduct> for Product {
    fn from(s: StoredProduct) -> Self {
        Product::new(s.id, s.name, &s.category, s.price, &s.description)
    }
}

/// Raw "add product" form input.
#[derive(Clone, Debug, Default)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub category: String,
    pub description: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self { name: name.into(), price: price.into(), ..Default::default() }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }

    /// Validates the draft and builds the product under `id`.
    pub fn into_product(self, id: ProductId) -> Result<Product, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() { return Err(ValidationError::MissingProductName); }
        let price = Money::parse(&self.price)
            .filter(|p| !p.is_negative())
            .ok_or_else(|| ValidationError::InvalidPrice(self.price.clone()))?;
        Ok(Product::new(id, name, self.category.trim(), price, self.description.trim()))
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() { fallback.to_string() } else { value.to_string() }
}
