//! Application session
//!
//! One `Session` is created when the app starts and handed to whatever needs
//! cart or list state. It owns the in-memory cart, the discounts typed for the
//! shopping list, and the repositories over the shared [`Storage`].

use tracing::{info, warn};

use crate::domain::aggregates::{Cart, LineItem};
use crate::domain::checkout::{CheckoutFlow, CheckoutForm, CheckoutReceipt};
use crate::domain::discount::{CouponOutcome, DiscountBreakdown, DiscountState};
use crate::domain::value_objects::{Money, ProductId};
use crate::repositories::{CatalogRepository, PurchaseHistoryRepository, ShoppingListRepository};
use crate::storage::Storage;
use crate::{Result, ValidationError};

#[derive(Debug)]
pub struct Session {
    catalog: CatalogRepository,
    history: PurchaseHistoryRepository,
    shopping_list: ShoppingListRepository,
    cart: Cart,
    list_items: Vec<LineItem>,
    discounts: DiscountState,
}

impl Session {
    pub fn new(storage: Storage) -> Self {
        Self {
            catalog: CatalogRepository::new(storage.clone()),
            history: PurchaseHistoryRepository::new(storage.clone()),
            shopping_list: ShoppingListRepository::new(storage),
            cart: Cart::new(),
            list_items: Vec::new(),
            discounts: DiscountState::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogRepository { &self.catalog }
    pub fn history(&self) -> &PurchaseHistoryRepository { &self.history }
    pub fn shopping_list(&self) -> &ShoppingListRepository { &self.shopping_list }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn cart_mut(&mut self) -> &mut Cart { &mut self.cart }

    /// Copies catalog product `id` into the cart. False if it is not in the catalog.
    pub async fn add_to_cart(&mut self, id: ProductId) -> bool {
        match self.catalog.find_product(id).await {
            Some(product) => {
                self.cart.add_to_cart(&product);
                true
            }
            None => false,
        }
    }

    /// Moves the cart into the purchase history.
    ///
    /// An empty cart fails without touching storage. The cart is cleared only
    /// once the history write succeeded.
    pub async fn finalize_purchase(&mut self, title: &str) -> bool {
        let Some(purchase) = self.cart.snapshot(title) else {
            warn!("finalize requested on an empty cart");
            return false;
        };
        let recorded = self.history.append_purchase(purchase).await;
        if recorded {
            self.cart.clear();
            info!("cart finalized");
        }
        recorded
    }

    /// Reloads the shopping list from storage and starts over with no
    /// discounts. Callers invoke this whenever the list comes back into view.
    pub async fn refresh_shopping_list(&mut self) -> &[LineItem] {
        self.list_items = self.shopping_list.load().await;
        self.discounts.reset();
        &self.list_items
    }

    pub fn shopping_list_items(&self) -> &[LineItem] { &self.list_items }

    pub fn shopping_list_subtotal(&self) -> Money { ShoppingListRepository::total(&self.list_items) }

    /// Removes a line from the persisted list and the loaded copy.
    pub async fn remove_from_shopping_list(&mut self, id: ProductId) -> bool {
        let removed = self.shopping_list.remove(id).await;
        if removed {
            self.list_items.retain(|i| i.id != id);
        }
        removed
    }

    pub fn discounts(&self) -> &DiscountState { &self.discounts }

    pub fn set_fixed_discount(&mut self, input: &str) -> std::result::Result<Money, ValidationError> {
        let subtotal = self.shopping_list_subtotal();
        self.discounts.set_fixed_amount(input, subtotal)
    }

    pub fn set_percent_discount(&mut self, input: &str) -> std::result::Result<rust_decimal::Decimal, ValidationError> {
        self.discounts.set_percent(input)
    }

    pub fn apply_coupon(&mut self, code: &str) -> std::result::Result<CouponOutcome, ValidationError> {
        self.discounts.apply_coupon(code)
    }

    pub fn remove_coupon(&mut self) { self.discounts.remove_coupon(); }

    pub fn discount_breakdown(&self) -> DiscountBreakdown { self.discounts.breakdown(self.shopping_list_subtotal()) }

    /// Starts checkout for the discounted shopping list total.
    pub fn begin_checkout(&self) -> CheckoutFlow { CheckoutFlow::new(self.discount_breakdown().final_total) }

    /// Submits `form`; on success the loaded list and discounts are dropped too.
    pub async fn checkout(&mut self, flow: &mut CheckoutFlow, form: &CheckoutForm) -> Result<CheckoutReceipt> {
        let receipt = flow.submit(form, &self.shopping_list).await?;
        self.list_items.clear();
        self.discounts.reset();
        Ok(receipt)
    }
}
