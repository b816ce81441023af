//! Per-surface history of generated images and videos.
//!
//! Every surface owns its own [`HistoryStore`]. There is no shared
//! in-memory copy: a store appends to its own lists, writes the *whole*
//! list back under a fixed key, and announces the change on the
//! [`EventBus`]. Other stores react by re-reading both lists from
//! durable storage and replacing their state wholesale.
//!
//! Two surfaces appending at the same time race: whichever writes last
//! replaces the other's list, dropping its addition. History is
//! single-user and rarely written from two places at once, so no merge
//! is attempted.

use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use seedream_core::{GeneratedImage, GeneratedVideo};
use seedream_events::{EventBus, HistoryEvent};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::StoreError;
use crate::keys;
use crate::kv::KeyValueStore;

/// Items per gallery page.
pub const PAGE_SIZE: usize = 6;

// ---------------------------------------------------------------------------
// HistorySnapshot
// ---------------------------------------------------------------------------

/// Immutable view of both history lists, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub images: Vec<GeneratedImage>,
    pub videos: Vec<GeneratedVideo>,
}

impl HistorySnapshot {
    pub fn find_image(&self, id: &str) -> Option<&GeneratedImage> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn find_video(&self, id: &str) -> Option<&GeneratedVideo> {
        self.videos.iter().find(|vid| vid.id == id)
    }

    /// Images on the 1-based gallery `page`. Out-of-range pages are empty.
    pub fn image_page(&self, page: usize) -> &[GeneratedImage] {
        page_of(&self.images, page)
    }

    /// Videos on the 1-based gallery `page`.
    pub fn video_page(&self, page: usize) -> &[GeneratedVideo] {
        page_of(&self.videos, page)
    }

    pub fn image_page_count(&self) -> usize {
        page_count(self.images.len())
    }

    pub fn video_page_count(&self) -> usize {
        page_count(self.videos.len())
    }

    /// Videos animated from the image with `image_id`.
    pub fn videos_for_image<'a>(
        &'a self,
        image_id: &'a str,
    ) -> impl Iterator<Item = &'a GeneratedVideo> + 'a {
        self.videos.iter().filter(move |vid| vid.image_id == image_id)
    }
}

fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

fn page_of<T>(items: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// One surface's cached view of durable history.
pub struct HistoryStore {
    surface: String,
    storage: Arc<dyn KeyValueStore>,
    bus: Arc<EventBus>,
    state: watch::Sender<HistorySnapshot>,
    /// Serialises this surface's read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store for `surface` and load both lists from storage.
    pub async fn open(
        surface: impl Into<String>,
        storage: Arc<dyn KeyValueStore>,
        bus: Arc<EventBus>,
    ) -> Self {
        let (state, _) = watch::channel(HistorySnapshot::default());
        let store = Self {
            surface: surface.into(),
            storage,
            bus,
            state,
            write_lock: Mutex::new(()),
        };
        store.reload().await;
        store
    }

    /// Name of the surface this store belongs to.
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Current in-memory state.
    pub fn snapshot(&self) -> HistorySnapshot {
        self.state.borrow().clone()
    }

    /// Receive every subsequent snapshot this store publishes.
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.state.subscribe()
    }

    /// Call `on_change` with each new snapshot until the store is dropped.
    pub fn on_change<F>(&self, on_change: F) -> JoinHandle<()>
    where
        F: Fn(&HistorySnapshot) + Send + 'static,
    {
        let mut rx = self.state.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                on_change(&snapshot);
            }
        })
    }

    /// Replace both in-memory lists with what durable storage holds.
    ///
    /// A list whose stored value cannot be read or decoded is logged and
    /// left as it was; a missing key reads as an empty list. Subscribers
    /// are only notified if something actually changed.
    pub async fn reload(&self) -> HistorySnapshot {
        let _guard = self.write_lock.lock().await;

        let images = self.read_list::<GeneratedImage>(keys::GENERATED_IMAGES).await;
        let videos = self.read_list::<GeneratedVideo>(keys::GENERATED_VIDEOS).await;

        self.state.send_if_modified(|snapshot| {
            let mut changed = false;
            if let Some(images) = images {
                if snapshot.images != images {
                    snapshot.images = images;
                    changed = true;
                }
            }
            if let Some(videos) = videos {
                if snapshot.videos != videos {
                    snapshot.videos = videos;
                    changed = true;
                }
            }
            changed
        });

        self.snapshot()
    }

    /// Add `image` as the newest entry, persist the full image list and
    /// notify the other surfaces.
    ///
    /// If the write fails nothing changes in memory and no event is sent.
    pub async fn append_image(&self, image: GeneratedImage) -> Result<HistorySnapshot, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = image.id.clone();
        let mut images = self.state.borrow().images.clone();
        images.insert(0, image);

        self.write_list(keys::GENERATED_IMAGES, &images).await?;
        let count = images.len();
        self.state.send_modify(|snapshot| snapshot.images = images);

        tracing::info!(surface = %self.surface, image_id = %id, count, "Image added to history");
        self.bus.publish(
            HistoryEvent::image_generated()
                .with_origin(self.surface.as_str())
                .with_artifact(id),
        );
        Ok(self.snapshot())
    }

    /// Add `video` as the newest entry, persist the full video list and
    /// notify the other surfaces.
    pub async fn append_video(&self, video: GeneratedVideo) -> Result<HistorySnapshot, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = video.id.clone();
        let mut videos = self.state.borrow().videos.clone();
        videos.insert(0, video);

        self.write_list(keys::GENERATED_VIDEOS, &videos).await?;
        let count = videos.len();
        self.state.send_modify(|snapshot| snapshot.videos = videos);

        tracing::info!(surface = %self.surface, video_id = %id, count, "Video added to history");
        self.bus.publish(
            HistoryEvent::video_generated()
                .with_origin(self.surface.as_str())
                .with_artifact(id),
        );
        Ok(self.snapshot())
    }

    /// Start reloading whenever another surface or the storage layer
    /// announces a change.
    ///
    /// The task holds only a weak reference and ends once the store is
    /// dropped (noticed on the next event) or the bus closes.
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let receiver = self.bus.subscribe();
        let store = Arc::downgrade(self);
        tokio::spawn(Self::run_sync(store, receiver))
    }

    async fn run_sync(store: Weak<Self>, mut receiver: broadcast::Receiver<HistoryEvent>) {
        loop {
            let event = receiver.recv().await;
            let Some(store) = store.upgrade() else {
                break;
            };
            match event {
                Ok(event) if event.is_from(&store.surface) => {}
                Ok(event) => {
                    tracing::debug!(
                        surface = %store.surface,
                        event = event.kind.name(),
                        "Reloading history"
                    );
                    store.reload().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        surface = %store.surface,
                        skipped,
                        "History sync lagged, reloading"
                    );
                    store.reload().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(surface = %store.surface, "Event bus closed, history sync stopping");
                    break;
                }
            }
        }
    }

    // ---- private helpers ----

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Vec::new()),
            Err(e) => {
                tracing::error!(surface = %self.surface, key, error = %e, "Failed to read history");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Some(list),
            Err(source) => {
                let e = StoreError::Serialization {
                    key: key.to_string(),
                    source,
                };
                tracing::error!(surface = %self.surface, key, error = %e, "Failed to decode history");
                None
            }
        }
    }

    async fn write_list<T: Serialize>(&self, key: &str, list: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(list).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.storage.set(key, &raw).await.inspect_err(|e| {
            tracing::error!(surface = %self.surface, key, error = %e, "Failed to save history");
        })
    }
}
