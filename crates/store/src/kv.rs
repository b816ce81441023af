//! Key/value persistence seam.
//!
//! Values are opaque strings; callers own the encoding. Every write
//! replaces the whole value for its key.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use seedream_events::{EventBus, HistoryEvent};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Durable string storage shared by every surface.
///
/// Access is unsynchronised read-modify-write across surfaces: the last
/// writer for a key wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Ephemeral in-process backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    bus: Option<Arc<EventBus>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a `StorageChanged` event on `bus` after every write.
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    fn announce(&self, key: &str) {
        if let Some(bus) = &self.bus {
            bus.publish(HistoryEvent::storage_changed(key));
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.announce(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.entries.write().await.remove(key);
        if removed.is_some() {
            self.announce(key);
        }
        Ok(())
    }
}
