//! Per-surface generation controller.
//!
//! Each [`GenerationSession`] owns one surface's [`HistoryStore`] and
//! drives the two generation flows (image, video) through
//! `Idle -> Requesting -> Completed | Failed`. Only one flow of each kind
//! may be requesting at a time; a second attempt is refused with
//! [`SessionError::Busy`] rather than queued.

use std::sync::Arc;

use seedream_client::{DownloadOutcome, GenerationClient, GenerationError, ShareOutcome};
use seedream_core::{ArtifactKind, CoreError, GeneratedImage, GeneratedVideo, GenerationRequest};
use seedream_events::EventBus;
use seedream_store::{HistorySnapshot, HistoryStore, KeyValueStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::SessionError;

/// Where one generation flow currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    Requesting,
    /// The last attempt produced `artifact_id`.
    Completed { artifact_id: String },
    /// The last attempt failed with `message`.
    Failed { message: String },
}

impl FlowState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, FlowState::Requesting)
    }
}

/// Everything a surface renders besides history itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub image: FlowState,
    pub video: FlowState,
    /// Text of the dismissible error banner.
    pub error: Option<String>,
    /// The most recent image request submitted on this surface.
    pub last_request: Option<GenerationRequest>,
}

impl SessionState {
    pub fn flow(&self, kind: ArtifactKind) -> &FlowState {
        match kind {
            ArtifactKind::Image => &self.image,
            ArtifactKind::Video => &self.video,
        }
    }

    fn flow_mut(&mut self, kind: ArtifactKind) -> &mut FlowState {
        match kind {
            ArtifactKind::Image => &mut self.image,
            ArtifactKind::Video => &mut self.video,
        }
    }
}

/// One mounted surface.
pub struct GenerationSession {
    client: Arc<GenerationClient>,
    history: Arc<HistoryStore>,
    state: watch::Sender<SessionState>,
    sync: JoinHandle<()>,
    seeding: JoinHandle<()>,
}

impl GenerationSession {
    /// Mount a new surface with a fresh id, loading history from
    /// `storage` and listening on `bus` for changes made elsewhere.
    pub async fn mount(
        client: Arc<GenerationClient>,
        storage: Arc<dyn KeyValueStore>,
        bus: Arc<EventBus>,
    ) -> Self {
        let surface = format!("surface-{}", Uuid::new_v4());
        let history = Arc::new(HistoryStore::open(surface, storage, bus).await);
        Self::with_history(client, history).await
    }

    /// Mount on an already opened history store.
    ///
    /// Everything in history, now and after every later reload, is handed
    /// to `client` so artifacts from earlier sessions or other surfaces
    /// can be downloaded and shared by id.
    pub async fn with_history(client: Arc<GenerationClient>, history: Arc<HistoryStore>) -> Self {
        let snapshot = history.snapshot();
        tracing::info!(
            surface = history.surface(),
            images = snapshot.images.len(),
            videos = snapshot.videos.len(),
            "Surface mounted"
        );
        client.remember_images(snapshot.images).await;
        client.remember_videos(snapshot.videos).await;

        let sync = history.spawn_sync();
        let seeding = spawn_seeding(Arc::clone(&client), history.subscribe());
        let (state, _) = watch::channel(SessionState::default());
        Self {
            client,
            history,
            state,
            sync,
            seeding,
        }
    }

    pub fn surface(&self) -> &str {
        self.history.surface()
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn client(&self) -> &Arc<GenerationClient> {
        &self.client
    }

    /// This surface's current view of history.
    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent change to flow state or the banner.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Dismiss the error banner.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    // ---- image flow ----

    /// Validate `request`, generate an image and add it to history.
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, SessionError> {
        let request = request.validated().map_err(|e| self.report(e.into()))?;
        let flight = self.begin(ArtifactKind::Image)?;
        self.state
            .send_modify(|s| s.last_request = Some(request.clone()));

        match self.run_image(&request).await {
            Ok(image) => {
                flight.complete(&image.id);
                Ok(image)
            }
            Err(e) => Err(flight.fail(e)),
        }
    }

    /// Generate again with the options of image `image_id`.
    pub async fn retry_image(&self, image_id: &str) -> Result<GeneratedImage, SessionError> {
        let image = self.find_image(image_id).await.map_err(|e| self.report(e))?;
        self.generate_image(&image.to_request()).await
    }

    /// Resubmit the most recent request made on this surface.
    pub async fn retry_last(&self) -> Result<GeneratedImage, SessionError> {
        let last = self.state.borrow().last_request.clone();
        match last {
            Some(request) => self.generate_image(&request).await,
            None => Err(self.report(
                CoreError::Validation("There is no previous request to retry".into()).into(),
            )),
        }
    }

    // ---- video flow ----

    /// Animate image `image_id` and add the video to history.
    pub async fn generate_video(&self, image_id: &str) -> Result<GeneratedVideo, SessionError> {
        let image = self.find_image(image_id).await.map_err(|e| self.report(e))?;
        let flight = self.begin(ArtifactKind::Video)?;

        match self.run_video(&image).await {
            Ok(video) => {
                flight.complete(&video.id);
                Ok(video)
            }
            Err(e) => Err(flight.fail(e)),
        }
    }

    // ---- artifact actions ----

    /// Download the image or video `id`, routed by its id prefix.
    pub async fn download(&self, id: &str) -> Result<DownloadOutcome, SessionError> {
        let result: Result<DownloadOutcome, SessionError> = match artifact_kind(id) {
            Ok(ArtifactKind::Image) => self.client.download_image(id).await.map_err(Into::into),
            Ok(ArtifactKind::Video) => self.client.download_video(id).await.map_err(Into::into),
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(e))
    }

    /// Share the image or video `id`, routed by its id prefix.
    pub async fn share(&self, id: &str) -> Result<ShareOutcome, SessionError> {
        let result: Result<ShareOutcome, SessionError> = match artifact_kind(id) {
            Ok(ArtifactKind::Image) => self.client.share_image(id).await.map_err(Into::into),
            Ok(ArtifactKind::Video) => self.client.share_video(id).await.map_err(Into::into),
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(e))
    }

    // ---- private helpers ----

    async fn run_image(&self, request: &GenerationRequest) -> Result<GeneratedImage, SessionError> {
        let image = self.client.generate_image(request).await?;
        self.history.append_image(image.clone()).await?;
        Ok(image)
    }

    async fn run_video(&self, image: &GeneratedImage) -> Result<GeneratedVideo, SessionError> {
        let video = self.client.generate_video(image).await?;
        self.history.append_video(video.clone()).await?;
        Ok(video)
    }

    /// History first, then anything the client knows that history has
    /// not caught up with.
    async fn find_image(&self, id: &str) -> Result<GeneratedImage, SessionError> {
        if let Some(image) = self.history.snapshot().find_image(id) {
            return Ok(image.clone());
        }
        self.client
            .generated_images()
            .await
            .into_iter()
            .find(|image| image.id == id)
            .ok_or_else(|| {
                GenerationError::NotFound {
                    kind: ArtifactKind::Image,
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Move `kind` to `Requesting` unless it already is. Starting a new
    /// attempt dismisses the banner.
    fn begin(&self, kind: ArtifactKind) -> Result<InFlight<'_>, SessionError> {
        let started = self.state.send_if_modified(|s| {
            let flow = s.flow_mut(kind);
            if flow.is_requesting() {
                return false;
            }
            *flow = FlowState::Requesting;
            s.error = None;
            true
        });
        if started {
            Ok(InFlight {
                state: &self.state,
                surface: self.surface(),
                kind,
                armed: true,
            })
        } else {
            tracing::debug!(surface = self.surface(), kind = kind.noun(), "Flow busy");
            Err(SessionError::Busy(kind))
        }
    }

    /// Show `error` in the banner without touching flow state.
    fn report(&self, error: SessionError) -> SessionError {
        let message = error.to_string();
        self.state.send_modify(|s| s.error = Some(message));
        error
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        self.sync.abort();
        self.seeding.abort();
    }
}

/// A flow that has entered `Requesting`.
///
/// Must end in [`complete`](Self::complete) or [`fail`](Self::fail). If
/// the generation future is dropped first, the flow returns to `Idle`
/// so the surface does not stay busy.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
    surface: &'a str,
    kind: ArtifactKind,
    armed: bool,
}

impl InFlight<'_> {
    fn complete(mut self, artifact_id: &str) {
        self.armed = false;
        self.state.send_modify(|s| {
            *s.flow_mut(self.kind) = FlowState::Completed {
                artifact_id: artifact_id.to_string(),
            };
        });
    }

    fn fail(mut self, error: SessionError) -> SessionError {
        self.armed = false;
        let message = error.to_string();
        tracing::warn!(surface = self.surface, kind = self.kind.noun(), error = %message, "Generation flow failed");
        self.state.send_modify(|s| {
            *s.flow_mut(self.kind) = FlowState::Failed {
                message: message.clone(),
            };
            s.error = Some(message);
        });
        error
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let kind = self.kind;
        let reset = self.state.send_if_modified(|s| {
            let flow = s.flow_mut(kind);
            if !flow.is_requesting() {
                return false;
            }
            *flow = FlowState::Idle;
            true
        });
        if reset {
            tracing::debug!(surface = self.surface, kind = kind.noun(), "Flow abandoned before completion");
        }
    }
}

/// Hand every artifact in each new history snapshot to `client`.
fn spawn_seeding(
    client: Arc<GenerationClient>,
    mut changes: watch::Receiver<HistorySnapshot>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let snapshot = changes.borrow_and_update().clone();
            client.remember_images(snapshot.images).await;
            client.remember_videos(snapshot.videos).await;
        }
    })
}

fn artifact_kind(id: &str) -> Result<ArtifactKind, SessionError> {
    ArtifactKind::from_id(id).ok_or_else(|| {
        CoreError::Validation(format!("Unknown artifact id: '{id}'")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_kind_follows_prefix() {
        assert_eq!(artifact_kind("img_1_abc").unwrap(), ArtifactKind::Image);
        assert_eq!(artifact_kind("vid_1_abc").unwrap(), ArtifactKind::Video);
        assert!(matches!(
            artifact_kind("doc_1_abc"),
            Err(SessionError::Core(CoreError::Validation(_)))
        ));
    }

    #[test]
    fn dropped_flight_returns_flow_to_idle() {
        let (state, _) = watch::channel(SessionState::default());
        state.send_modify(|s| s.image = FlowState::Requesting);

        drop(InFlight {
            state: &state,
            surface: "test",
            kind: ArtifactKind::Image,
            armed: true,
        });

        assert_eq!(state.borrow().image, FlowState::Idle);
    }

    #[test]
    fn completed_flight_keeps_its_result() {
        let (state, _) = watch::channel(SessionState::default());
        state.send_modify(|s| s.video = FlowState::Requesting);

        InFlight {
            state: &state,
            surface: "test",
            kind: ArtifactKind::Video,
            armed: true,
        }
        .complete("vid_1_abc");

        assert_eq!(
            state.borrow().video,
            FlowState::Completed {
                artifact_id: "vid_1_abc".into()
            }
        );
    }

    #[test]
    fn flow_lookup_matches_kind() {
        let state = SessionState {
            video: FlowState::Requesting,
            ..Default::default()
        };
        assert_eq!(state.flow(ArtifactKind::Image), &FlowState::Idle);
        assert!(state.flow(ArtifactKind::Video).is_requesting());
    }
}
