//! Aggregates module
pub mod product;
pub mod cart;
pub mod purchase;

pub use product::{Product, ProductDraft, DEFAULT_CATEGORY};
pub use cart::{items_total, Cart, LineItem};
pub use purchase::{NewPurchase, PurchaseHistoryEntry, DEFAULT_PURCHASE_TITLE};
