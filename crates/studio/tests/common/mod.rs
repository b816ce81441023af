//! Shared fixtures for session tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use seedream_client::{GenerationClient, Host, HostError, SharePayload, WebhookApi};
use seedream_events::EventBus;
use seedream_store::{KeyValueStore, MemoryStore};
use seedream_studio::GenerationSession;
use serde_json::{json, Value};
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    image_status: Option<StatusCode>,
    image_calls: usize,
    video_calls: usize,
    counter: usize,
}

/// Webhook mock that answers every image request with a distinct URL.
///
/// While [`hold`](Self::hold) is in effect, image requests wait until the
/// returned [`Notify`] is signalled.
#[derive(Clone)]
pub struct MockWebhook {
    inner: Arc<Mutex<Inner>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
    pub base_url: String,
}

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<Inner>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MockWebhook {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let gate = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route("/image", post(image_hook))
            .route("/video", post(video_hook))
            .with_state(AppState {
                inner: Arc::clone(&inner),
                gate: Arc::clone(&gate),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            inner,
            gate,
            base_url: format!("http://{addr}"),
        }
    }

    /// Make image requests wait for the returned notifier.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }

    /// Stop holding image requests and let any held one through.
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    /// Fail image requests with `status` from now on.
    pub fn fail_images(&self, status: StatusCode) {
        self.inner.lock().unwrap().image_status = Some(status);
    }

    pub fn recover(&self) {
        self.inner.lock().unwrap().image_status = None;
    }

    pub fn image_calls(&self) -> usize {
        self.inner.lock().unwrap().image_calls
    }

    pub fn video_calls(&self) -> usize {
        self.inner.lock().unwrap().video_calls
    }

    pub fn client(&self, host: Arc<dyn Host>) -> Arc<GenerationClient> {
        Arc::new(GenerationClient::new(
            WebhookApi::new(
                format!("{}/image", self.base_url),
                format!("{}/video", self.base_url),
            ),
            host,
        ))
    }
}

async fn image_hook(State(state): State<AppState>) -> Response {
    let gate = state.gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    let (status, n) = {
        let mut inner = state.inner.lock().unwrap();
        inner.image_calls += 1;
        inner.counter += 1;
        (inner.image_status, inner.counter)
    };
    match status {
        Some(status) => (status, "upstream exploded").into_response(),
        None => Json(json!([{ "imageUrl": format!("https://cdn.example/{n}.png") }])).into_response(),
    }
}

async fn video_hook(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let n = {
        let mut inner = state.inner.lock().unwrap();
        inner.video_calls += 1;
        inner.counter += 1;
        inner.counter
    };
    Json(json!({
        "videoUrl": format!("https://cdn.example/{n}.mp4"),
        "echoImageId": body["imageId"],
    }))
    .into_response()
}

/// Host with no native share that records clipboard writes.
#[derive(Default)]
pub struct ClipboardHost {
    pub clipboard: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

#[async_trait]
impl Host for ClipboardHost {
    async fn save_file(&self, filename: &str, _bytes: &[u8]) -> Result<PathBuf, HostError> {
        Ok(PathBuf::from(filename))
    }

    async fn open_external(&self, _url: &str) -> Result<(), HostError> {
        Ok(())
    }

    fn can_share(&self, _payload: &SharePayload) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> Result<(), HostError> {
        Err(HostError::Unsupported("native share"))
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

/// Shared storage and bus, as seen by every surface of one process.
pub struct World {
    pub mock: MockWebhook,
    pub bus: Arc<EventBus>,
    pub storage: Arc<dyn KeyValueStore>,
    pub host: Arc<ClipboardHost>,
}

impl World {
    pub async fn new() -> Self {
        let bus = Arc::new(EventBus::default());
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::new().with_bus(Arc::clone(&bus)));
        Self {
            mock: MockWebhook::start().await,
            bus,
            storage,
            host: Arc::new(ClipboardHost::default()),
        }
    }

    /// Mount a surface with its own client.
    pub async fn mount(&self) -> GenerationSession {
        let client = self.mock.client(self.host.clone());
        GenerationSession::mount(client, Arc::clone(&self.storage), Arc::clone(&self.bus)).await
    }
}
