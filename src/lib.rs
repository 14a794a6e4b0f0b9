//! Pocket Cart
//!
//! Local-first shopping engine behind a mobile shopping-list app.
//!
//! ## Features
//! - Product catalog persisted on the device
//! - Cart with quantity merging and totals
//! - Fixed, percentage and coupon discounts
//! - Persisted shopping list with user-edited prices
//! - Purchase history
//! - Mock checkout with shipping and payment validation
//!
//! Everything is stored as JSON blobs in a [`storage::KeyValueStore`]; the
//! SQLite backend stands in for the device's async storage.

pub mod config;
pub mod domain;
pub mod repositories;
pub mod session;
pub mod storage;

pub use domain::aggregates::{Cart, LineItem, NewPurchase, Product, ProductDraft, PurchaseHistoryEntry};
pub use domain::checkout::{CheckoutFlow, CheckoutForm, CheckoutReceipt, CheckoutState, PaymentMethod};
pub use domain::discount::{CouponOutcome, DiscountBreakdown, DiscountState};
pub use domain::value_objects::{Money, ProductId, PurchaseId};
pub use repositories::{CatalogRepository, PurchaseHistoryRepository, ShoppingListRepository};
pub use session::Session;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, Storage, StorageError};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Malformed user input. Recovered locally and shown to the user; state is
/// left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Product name is required")]
    MissingProductName,

    #[error("Invalid price (up to 2 decimals, at most 1000000000): {0:?}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0:?}")]
    InvalidQuantity(String),

    #[error("Invalid discount amount: {0:?}")]
    InvalidFixedDiscount(String),

    #[error("Invalid discount percentage (0-100): {0:?}")]
    InvalidPercent(String),

    #[error("Coupon code is required")]
    MissingCouponCode,

    #[error("Invalid or expired coupon: {0}")]
    UnknownCoupon(String),

    #[error("Full name is required")]
    MissingName,

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Card number must have 16 digits")]
    InvalidCardNumber,

    #[error("Card expiry must be MM/YY")]
    InvalidCardExpiry,

    #[error("Card security code must have 3 digits")]
    InvalidCardCvv,
}

#[derive(Error, Debug)]
pub enum ShopError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Checkout already completed")]
    CheckoutCompleted,
}

pub type Result<T> = std::result::Result<T, ShopError>;
