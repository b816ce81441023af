//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the hub every surface shares (via `Arc<EventBus>`) to
//! learn that durable history changed. Events carry no history data:
//! receivers reload from storage, so the bus only has to say *that*
//! something changed and, for diagnostics, where.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use seedream_core::types::{ArtifactId, Timestamp};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// HistoryEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryEventKind {
    /// A surface appended a new image and persisted the image list.
    ImageGenerated,
    /// A surface appended a new video and persisted the video list.
    VideoGenerated,
    /// The storage layer wrote or removed `key`.
    StorageChanged { key: String },
}

impl HistoryEventKind {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            HistoryEventKind::ImageGenerated => "imageGenerated",
            HistoryEventKind::VideoGenerated => "videoGenerated",
            HistoryEventKind::StorageChanged { .. } => "storage",
        }
    }
}

/// A history change notification.
///
/// Constructed via the kind-specific constructors and enriched with
/// [`with_origin`](HistoryEvent::with_origin) and
/// [`with_artifact`](HistoryEvent::with_artifact).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,

    /// Surface that caused the change, if known. Storage-layer events
    /// have no origin.
    pub origin: Option<String>,

    /// Id of the artifact that was added, for generation events.
    pub artifact_id: Option<ArtifactId>,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl HistoryEvent {
    pub fn new(kind: HistoryEventKind) -> Self {
        Self {
            kind,
            origin: None,
            artifact_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn image_generated() -> Self {
        Self::new(HistoryEventKind::ImageGenerated)
    }

    pub fn video_generated() -> Self {
        Self::new(HistoryEventKind::VideoGenerated)
    }

    pub fn storage_changed(key: impl Into<String>) -> Self {
        Self::new(HistoryEventKind::StorageChanged { key: key.into() })
    }

    /// Attach the originating surface.
    pub fn with_origin(mut self, surface: impl Into<String>) -> Self {
        self.origin = Some(surface.into());
        self
    }

    /// Attach the id of the artifact this event announces.
    pub fn with_artifact(mut self, id: impl Into<ArtifactId>) -> Self {
        self.artifact_id = Some(id.into());
        self
    }

    /// Whether `surface` caused this event.
    pub fn is_from(&self, surface: &str) -> bool {
        self.origin.as_deref() == Some(surface)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use seedream_events::bus::{EventBus, HistoryEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(HistoryEvent::image_generated().with_origin("gallery"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<HistoryEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is silently dropped.
    pub fn publish(&self, event: HistoryEvent) {
        tracing::debug!(
            event = event.kind.name(),
            origin = event.origin.as_deref().unwrap_or("-"),
            "Publishing history event"
        );
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
