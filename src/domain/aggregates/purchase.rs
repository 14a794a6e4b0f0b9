//! Purchase Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::cart::{items_total, LineItem};
use crate::domain::value_objects::{Money, PurchaseId};

pub const DEFAULT_PURCHASE_TITLE: &str = "Compra";

/// A cart snapshot on its way into the history. Id and date are assigned by
/// the history repository, never by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPurchase {
    pub title: String,
    pub items: Vec<LineItem>,
    pub total: Money,
}

impl NewPurchase {
    pub fn new(title: &str, items: Vec<LineItem>) -> Self {
        let total = items_total(&items);
        Self { title: purchase_title(Some(title)), items, total }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredPurchase")]
pub struct PurchaseHistoryEntry {
    pub id: PurchaseId,
    pub date: DateTime<Utc>,
    pub title: String,
    pub items: Vec<LineItem>,
    pub total: Money,
}

impl PurchaseHistoryEntry {
    pub fn finalize(purchase: NewPurchase, id: PurchaseId, date: DateTime<Utc>) -> Self {
        Self { id, date, title: purchase.title, items: purchase.items, total: purchase.total }
    }

    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
}

#[derive(Deserialize)]
struct StoredPurchase {
    id: PurchaseId,
    date: DateTime<Utc>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    total: Option<Money>,
}

impl From<StoredPurchase> for PurchaseHistoryEntry {
    fn from(s: StoredPurchase) -> Self {
        let total = s.total.unwrap_or_else(|| items_total(&s.items));
        Self { id: s.id, date: s.date, title: purchase_title(s.title.as_deref()), items: s.items, total }
    }
}

fn purchase_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_PURCHASE_TITLE.to_string(),
    }
}
