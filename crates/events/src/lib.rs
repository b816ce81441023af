//! Seedream history notification bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`HistoryEvent`]: the notification envelope every surface listens
//!   for before reloading history from durable storage.

pub mod bus;

pub use bus::{EventBus, HistoryEvent, HistoryEventKind};
