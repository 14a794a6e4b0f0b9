//! Repositories over the persisted blobs.
//!
//! Each repository owns one storage key. Reads degrade to an empty value when
//! the blob is missing or unreadable; writes report failure instead of
//! raising.

mod catalog;
mod history;
mod shopping_list;

pub use catalog::{sample_products, CatalogRepository};
pub use history::PurchaseHistoryRepository;
pub use shopping_list::ShoppingListRepository;
