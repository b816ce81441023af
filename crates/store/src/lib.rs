//! Durable history storage for Seedream surfaces.
//!
//! - [`KeyValueStore`]: string key/value persistence seam, with
//!   [`FileStore`] and [`MemoryStore`] backends.
//! - [`HistoryStore`]: one surface's in-memory view of generated images
//!   and videos, persisted as whole lists and resynchronised through the
//!   [`EventBus`](seedream_events::EventBus).
//! - [`preferences`]: the persisted UI language.

pub mod error;
pub mod file;
pub mod history;
pub mod keys;
pub mod kv;
pub mod preferences;

pub use error::StoreError;
pub use file::FileStore;
pub use history::{HistorySnapshot, HistoryStore};
pub use kv::{KeyValueStore, MemoryStore};
