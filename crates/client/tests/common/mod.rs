//! Shared fixtures: a local mock webhook server and a recording host.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use seedream_client::{GenerationClient, Host, HostError, SharePayload, WebhookApi};

// ---------------------------------------------------------------------------
// Mock webhook server
// ---------------------------------------------------------------------------

/// What the mock answers on a webhook route.
#[derive(Clone)]
pub enum Reply {
    Json(StatusCode, serde_json::Value),
    Text(StatusCode, String),
}

impl Reply {
    pub fn ok(value: serde_json::Value) -> Self {
        Reply::Json(StatusCode::OK, value)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(status, value) => (status, Json(value)).into_response(),
            Reply::Text(status, text) => (status, text).into_response(),
        }
    }
}

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

struct Inner {
    image_reply: Reply,
    video_reply: Reply,
    files: HashMap<String, Vec<u8>>,
    requests: Vec<Recorded>,
}

#[derive(Clone)]
pub struct MockWebhook {
    inner: Arc<Mutex<Inner>>,
    pub base_url: String,
}

impl MockWebhook {
    /// Start a mock on an ephemeral localhost port.
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            image_reply: Reply::ok(serde_json::json!({})),
            video_reply: Reply::ok(serde_json::json!({})),
            files: HashMap::new(),
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/image", post(image_hook))
            .route("/video", post(video_hook))
            .route("/files/{name}", get(file))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            inner,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn image_endpoint(&self) -> String {
        format!("{}/image", self.base_url)
    }

    pub fn video_endpoint(&self) -> String {
        format!("{}/video", self.base_url)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{name}", self.base_url)
    }

    pub fn reply_image(&self, reply: Reply) {
        self.inner.lock().unwrap().image_reply = reply;
    }

    pub fn reply_video(&self, reply: Reply) {
        self.inner.lock().unwrap().video_reply = reply;
    }

    pub fn serve_file(&self, name: &str, bytes: Vec<u8>) {
        self.inner.lock().unwrap().files.insert(name.to_string(), bytes);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// A client pointed at this mock, using `host` for side effects.
    pub fn client(&self, host: Arc<dyn Host>) -> GenerationClient {
        GenerationClient::new(
            WebhookApi::new(self.image_endpoint(), self.video_endpoint()),
            host,
        )
    }
}

fn record(inner: &Mutex<Inner>, method: &'static str, path: String, body: Option<&[u8]>) {
    let body = body.and_then(|b| serde_json::from_slice(b).ok());
    inner
        .lock()
        .unwrap()
        .requests
        .push(Recorded { method, path, body });
}

async fn image_hook(State(inner): State<Arc<Mutex<Inner>>>, body: Bytes) -> Reply {
    record(&inner, "POST", "/image".into(), Some(&body));
    let reply = inner.lock().unwrap().image_reply.clone();
    reply
}

async fn video_hook(State(inner): State<Arc<Mutex<Inner>>>, body: Bytes) -> Reply {
    record(&inner, "POST", "/video".into(), Some(&body));
    let reply = inner.lock().unwrap().video_reply.clone();
    reply
}

async fn file(State(inner): State<Arc<Mutex<Inner>>>, Path(name): Path<String>) -> Response {
    record(&inner, "GET", format!("/files/{name}"), None);
    let found = inner.lock().unwrap().files.get(&name).cloned();
    match found {
        Some(bytes) => (StatusCode::OK, bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A localhost URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hook")
}

// ---------------------------------------------------------------------------
// Recording host
// ---------------------------------------------------------------------------

/// Host that records every side effect and can be told to fail.
#[derive(Default)]
pub struct RecordingHost {
    pub native_share: bool,
    pub fail_save: bool,
    pub fail_open: bool,
    pub fail_share: bool,
    pub fail_clipboard: bool,

    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub opened: Mutex<Vec<String>>,
    pub shared: Mutex<Vec<SharePayload>>,
    pub clipboard: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

#[async_trait]
impl Host for RecordingHost {
    async fn save_file(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, HostError> {
        if self.fail_save {
            return Err(HostError::Io(std::io::Error::other("disk full")));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(filename))
    }

    async fn open_external(&self, url: &str) -> Result<(), HostError> {
        if self.fail_open {
            return Err(HostError::Unsupported("open"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn can_share(&self, _payload: &SharePayload) -> bool {
        self.native_share
    }

    async fn share(&self, payload: &SharePayload) -> Result<(), HostError> {
        if self.fail_share {
            return Err(HostError::Command {
                command: "share".into(),
                detail: "cancelled".into(),
            });
        }
        self.shared.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        if self.fail_clipboard {
            return Err(HostError::Unsupported("clipboard"));
        }
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}
