//! Purchase history under `@shopping_app:purchase_history`, newest first.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::aggregates::{NewPurchase, PurchaseHistoryEntry};
use crate::domain::value_objects::PurchaseId;
use crate::storage::{keys, Storage, StorageError};

#[derive(Clone, Debug)]
pub struct PurchaseHistoryRepository {
    storage: Storage,
}

impl PurchaseHistoryRepository {
    pub fn new(storage: Storage) -> Self { Self { storage } }

    pub async fn get_history(&self) -> Vec<PurchaseHistoryEntry> {
        match self.storage.read::<Vec<PurchaseHistoryEntry>>(keys::PURCHASE_HISTORY).await {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not load purchase history");
                Vec::new()
            }
        }
    }

    pub async fn find(&self, id: &PurchaseId) -> Option<PurchaseHistoryEntry> {
        self.get_history().await.into_iter().find(|e| &e.id == id)
    }

    /// Stamps `purchase` with a new id and the current time and prepends it.
    pub async fn record(&self, purchase: NewPurchase) -> Result<PurchaseHistoryEntry, StorageError> {
        let entry = PurchaseHistoryEntry::finalize(purchase, PurchaseId::generate(), Utc::now());
        self.storage
            .update(keys::PURCHASE_HISTORY, |history: &mut Vec<PurchaseHistoryEntry>| {
                history.insert(0, entry.clone());
            })
            .await?;
        info!(id = %entry.id, total = %entry.total, items = entry.items.len(), "purchase recorded");
        Ok(entry)
    }

    /// [`record`](Self::record) reduced to a success flag. On failure the
    /// stored history is left as it was.
    pub async fn append_purchase(&self, purchase: NewPurchase) -> bool {
        match self.record(purchase).await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "could not add purchase to history");
                false
            }
        }
    }

    /// Drops the entry with `id`, if any. False only when storage fails.
    pub async fn remove_entry(&self, id: &PurchaseId) -> bool {
        let result = self
            .storage
            .update(keys::PURCHASE_HISTORY, |history: &mut Vec<PurchaseHistoryEntry>| {
                history.retain(|e| &e.id != id);
            })
            .await;
        if let Err(e) = result {
            error!(error = %e, %id, "could not remove purchase from history");
            return false;
        }
        true
    }

    pub async fn clear_all(&self) -> bool {
        match self.storage.remove(keys::PURCHASE_HISTORY).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "could not clear purchase history");
                false
            }
        }
    }
}
