//! HTTP layer for the generation webhooks.
//!
//! Wraps the two fixed webhook endpoints and plain artifact fetches
//! using [`reqwest`]. No timeout is configured: a generation runs until
//! the webhook answers or the connection fails.

use reqwest::header::ACCEPT;
use serde::Serialize;
use seedream_core::ArtifactKind;

use crate::error::GenerationError;
use crate::payload::{ImagePayload, VideoPayload};

/// HTTP client for the image and video webhooks.
pub struct WebhookApi {
    client: reqwest::Client,
    image_url: String,
    video_url: String,
}

impl WebhookApi {
    /// Create an API client for the given webhook URLs.
    pub fn new(image_url: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), image_url, video_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        image_url: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            image_url: image_url.into(),
            video_url: video_url.into(),
        }
    }

    /// Post an image request and return the decoded JSON response.
    pub async fn submit_image(
        &self,
        payload: &ImagePayload<'_>,
    ) -> Result<serde_json::Value, GenerationError> {
        self.post_json(ArtifactKind::Image, &self.image_url, payload)
            .await
    }

    /// Post a video request and return the decoded JSON response.
    pub async fn submit_video(
        &self,
        payload: &VideoPayload<'_>,
    ) -> Result<serde_json::Value, GenerationError> {
        self.post_json(ArtifactKind::Video, &self.video_url, payload)
            .await
    }

    /// Download the raw bytes of a generated artifact.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        kind: ArtifactKind,
        url: &str,
        body: &T,
    ) -> Result<serde_json::Value, GenerationError> {
        tracing::info!(kind = kind.noun(), url, "Sending generation request");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(kind, e))?;

        tracing::debug!(kind = kind.noun(), status = response.status().as_u16(), "Webhook responded");

        let response = Self::ensure_success(kind, response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::from_transport(kind, e))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(kind = kind.noun(), error = %e, body = %text, "Webhook returned non-JSON body");
            GenerationError::MalformedResponse {
                kind,
                detail: e.to_string(),
            }
        })
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GenerationError::Status`]
    /// carrying the status and body text on failure.
    async fn ensure_success(
        kind: ArtifactKind,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(kind = kind.noun(), status = status.as_u16(), body = %body, "Webhook error response");
            return Err(GenerationError::Status {
                kind,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
