//! Key-value blob storage
//!
//! Every piece of persisted state is one JSON document under one string key,
//! read and written as a whole. [`KeyValueStore`] is the device-storage
//! contract; [`Storage`] layers typed JSON access and per-key write
//! serialization on top of any backend.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Storage keys shared with earlier versions of the app.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const SHOPPING_LIST: &str = "shoppingList";
    pub const PURCHASE_HISTORY: &str = "@shopping_app:purchase_history";
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("Storage migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt value under {key:?}: {source}")]
    Corrupt { key: String, source: serde_json::Error },

    #[error("Could not encode value for {key:?}: {source}")]
    Encode { key: String, source: serde_json::Error },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Device-local blob store. Values are JSON text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One async mutex per storage key, created on first use.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Typed handle over a [`KeyValueStore`].
///
/// Clones share the backend and the key locks, so every repository built from
/// the same `Storage` sees its own writes in order.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    locks: Arc<KeyLocks>,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend, locks: Arc::new(KeyLocks::default()) }
    }

    pub fn in_memory() -> Self { Self::new(MemoryStore::new()) }

    /// Reads and decodes `key`. `Ok(None)` when nothing is stored.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Corrupt { key: key.to_string(), source }),
            None => Ok(None),
        }
    }

    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let _guard = self.locks.acquire(key).await;
        self.put(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.locks.acquire(key).await;
        self.backend.remove(key).await
    }

    /// Read-modify-write of one blob under the key's lock.
    ///
    /// A missing blob starts from `T::default()`. A corrupt blob fails the
    /// whole update and is left untouched. Nothing is written when `f` leaves
    /// the value encoding the same as before.
    pub async fn update<T, R, F>(&self, key: &str, f: F) -> Result<R, StorageError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.locks.acquire(key).await;
        let mut value: T = self.read(key).await?.unwrap_or_default();
        let before = encode(key, &value)?;
        let result = f(&mut value);
        let after = encode(key, &value)?;
        if after != before {
            self.backend.set(key, after).await?;
            debug!(key, "blob updated");
        }
        Ok(result)
    }

    async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.backend.set(key, encode(key, value)?).await
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode { key: key.to_string(), source })
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
