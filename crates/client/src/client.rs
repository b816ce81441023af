//! The generation client.
//!
//! [`GenerationClient`] is an explicit, injectable object: each surface
//! (or test) builds its own. It keeps a private list of every artifact
//! it produced or was told about, used to resolve ids for download,
//! share and retry. That list is deliberately separate from durable
//! history and is never synchronised with it.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use image::ImageFormat;
use seedream_core::naming::{image_filename, video_filename};
use seedream_core::{ArtifactKind, GeneratedImage, GeneratedVideo, GenerationRequest};
use tokio::sync::RwLock;

use crate::api::WebhookApi;
use crate::config::ClientConfig;
use crate::error::GenerationError;
use crate::host::{Host, HostError, SharePayload};
use crate::payload::{extract_result_url, ImagePayload, VideoPayload, IMAGE_URL_FIELD, VIDEO_URL_FIELD};

/// Share sheet title for images.
pub const IMAGE_SHARE_TITLE: &str = "Generated with Seedream 4.0";
/// Share sheet title for videos.
pub const VIDEO_SHARE_TITLE: &str = "Generated Video with Seedream 4.0";

/// How a download request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact was fetched and saved locally.
    Saved(PathBuf),
    /// Fetching or saving failed; the remote artifact was opened instead.
    OpenedExternally,
}

/// How a share request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The host's native share interaction completed.
    Shared,
    /// The URL was copied to the clipboard and the user notified.
    CopiedToClipboard,
}

/// Why a local save attempt failed. Never surfaced: every variant leads
/// to the open-externally fallback.
#[derive(Debug, thiserror::Error)]
enum SaveError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("re-encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("re-encode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Issues generation requests and performs artifact side effects.
pub struct GenerationClient {
    api: WebhookApi,
    host: Arc<dyn Host>,
    /// Newest first.
    images: RwLock<Vec<GeneratedImage>>,
    /// Newest first.
    videos: RwLock<Vec<GeneratedVideo>>,
}

impl GenerationClient {
    pub fn new(api: WebhookApi, host: Arc<dyn Host>) -> Self {
        Self {
            api,
            host,
            images: RwLock::new(Vec::new()),
            videos: RwLock::new(Vec::new()),
        }
    }

    /// Build a client for the webhooks named in `config`.
    pub fn from_config(config: &ClientConfig, host: Arc<dyn Host>) -> Self {
        Self::new(
            WebhookApi::new(
                config.image_webhook_url.clone(),
                config.video_webhook_url.clone(),
            ),
            host,
        )
    }

    // ---- generation ----

    /// Generate one image for `request`.
    ///
    /// The prompt is sent as given; callers validate it beforehand. On
    /// success the new image is added to this client's list and
    /// returned. On failure nothing is recorded.
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let kind = ArtifactKind::Image;
        let body = self
            .api
            .submit_image(&ImagePayload::new(request))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Image generation failed"))?;

        let url = extract_result_url(&body, IMAGE_URL_FIELD).ok_or_else(|| {
            tracing::error!(response = %body, "No image URL found in response");
            GenerationError::MissingField { kind }
        })?;

        let image = GeneratedImage::from_request(request, url);
        tracing::info!(image_id = %image.id, url = %image.url, "Image generated");
        self.images.write().await.insert(0, image.clone());
        Ok(image)
    }

    /// Regenerate the image with `image_id` using its original options.
    pub async fn retry_generation(&self, image_id: &str) -> Result<GeneratedImage, GenerationError> {
        let original = self.find_image(image_id).await?;
        self.generate_image(&original.to_request()).await
    }

    /// Animate `image` into a video.
    ///
    /// The returned video records `image`'s id and url as they are now.
    pub async fn generate_video(
        &self,
        image: &GeneratedImage,
    ) -> Result<GeneratedVideo, GenerationError> {
        let kind = ArtifactKind::Video;
        let body = self
            .api
            .submit_video(&VideoPayload::new(image))
            .await
            .inspect_err(|e| tracing::error!(image_id = %image.id, error = %e, "Video generation failed"))?;

        let url = extract_result_url(&body, VIDEO_URL_FIELD).ok_or_else(|| {
            tracing::error!(response = %body, "No video URL found in response");
            GenerationError::MissingField { kind }
        })?;

        let video = GeneratedVideo::from_image(image, url);
        tracing::info!(video_id = %video.id, image_id = %image.id, url = %video.url, "Video generated");
        self.videos.write().await.insert(0, video.clone());
        Ok(video)
    }

    // ---- known artifacts ----

    /// Everything this client generated or was told about, newest first.
    pub async fn generated_images(&self) -> Vec<GeneratedImage> {
        self.images.read().await.clone()
    }

    pub async fn generated_videos(&self) -> Vec<GeneratedVideo> {
        self.videos.read().await.clone()
    }

    /// Make previously persisted images resolvable by id. Images already
    /// known are skipped; order among the given images is kept, after
    /// anything generated in this process.
    pub async fn remember_images(&self, images: impl IntoIterator<Item = GeneratedImage>) {
        let mut known = self.images.write().await;
        for image in images {
            if !known.iter().any(|k| k.id == image.id) {
                known.push(image);
            }
        }
    }

    pub async fn remember_videos(&self, videos: impl IntoIterator<Item = GeneratedVideo>) {
        let mut known = self.videos.write().await;
        for video in videos {
            if !known.iter().any(|k| k.id == video.id) {
                known.push(video);
            }
        }
    }

    // ---- download ----

    /// Save the image with `id` as a PNG.
    ///
    /// The fetched bytes are decoded and re-encoded so every download is
    /// a PNG regardless of what the CDN served. If fetching, re-encoding
    /// or saving fails, the image is opened externally instead.
    pub async fn download_image(&self, id: &str) -> Result<DownloadOutcome, GenerationError> {
        let image = self.find_image(id).await?;
        let filename = image_filename(&image.prompt, Utc::now().date_naive());

        match self.save_as_png(&image.url, &filename).await {
            Ok(path) => Ok(DownloadOutcome::Saved(path)),
            Err(e) => {
                tracing::warn!(image_id = %id, error = %e, "Image download failed, opening externally");
                self.open_fallback(ArtifactKind::Image, &image.url).await
            }
        }
    }

    /// Save the video with `id` as served.
    pub async fn download_video(&self, id: &str) -> Result<DownloadOutcome, GenerationError> {
        let video = self.find_video(id).await?;
        let filename = video_filename(&video.prompt, Utc::now().date_naive());

        match self.save_raw(&video.url, &filename).await {
            Ok(path) => Ok(DownloadOutcome::Saved(path)),
            Err(e) => {
                tracing::warn!(video_id = %id, error = %e, "Video download failed, opening externally");
                self.open_fallback(ArtifactKind::Video, &video.url).await
            }
        }
    }

    // ---- share ----

    pub async fn share_image(&self, id: &str) -> Result<ShareOutcome, GenerationError> {
        let image = self.find_image(id).await?;
        let payload = SharePayload {
            title: IMAGE_SHARE_TITLE.to_string(),
            text: image.prompt,
            url: image.url,
        };
        self.share(ArtifactKind::Image, payload).await
    }

    pub async fn share_video(&self, id: &str) -> Result<ShareOutcome, GenerationError> {
        let video = self.find_video(id).await?;
        let payload = SharePayload {
            title: VIDEO_SHARE_TITLE.to_string(),
            text: video.prompt,
            url: video.url,
        };
        self.share(ArtifactKind::Video, payload).await
    }

    // ---- private helpers ----

    async fn find_image(&self, id: &str) -> Result<GeneratedImage, GenerationError> {
        self.images
            .read()
            .await
            .iter()
            .find(|img| img.id == id)
            .cloned()
            .ok_or_else(|| GenerationError::NotFound {
                kind: ArtifactKind::Image,
                id: id.to_string(),
            })
    }

    async fn find_video(&self, id: &str) -> Result<GeneratedVideo, GenerationError> {
        self.videos
            .read()
            .await
            .iter()
            .find(|vid| vid.id == id)
            .cloned()
            .ok_or_else(|| GenerationError::NotFound {
                kind: ArtifactKind::Video,
                id: id.to_string(),
            })
    }

    async fn save_as_png(&self, url: &str, filename: &str) -> Result<PathBuf, SaveError> {
        let fetched = self.api.fetch_bytes(url).await?;
        let png = tokio::task::spawn_blocking(move || reencode_png(&fetched)).await??;
        Ok(self.host.save_file(filename, &png).await?)
    }

    async fn save_raw(&self, url: &str, filename: &str) -> Result<PathBuf, SaveError> {
        let fetched = self.api.fetch_bytes(url).await?;
        Ok(self.host.save_file(filename, &fetched).await?)
    }

    async fn open_fallback(
        &self,
        kind: ArtifactKind,
        url: &str,
    ) -> Result<DownloadOutcome, GenerationError> {
        self.host
            .open_external(url)
            .await
            .map(|()| DownloadOutcome::OpenedExternally)
            .map_err(|source| {
                tracing::error!(kind = kind.noun(), url, error = %source, "Could not open download externally");
                GenerationError::DownloadFailed { kind, source }
            })
    }

    /// Native share when the host supports it, otherwise (or if it
    /// fails) copy the URL and acknowledge.
    async fn share(
        &self,
        kind: ArtifactKind,
        payload: SharePayload,
    ) -> Result<ShareOutcome, GenerationError> {
        if self.host.can_share(&payload) {
            match self.host.share(&payload).await {
                Ok(()) => return Ok(ShareOutcome::Shared),
                Err(e) => {
                    tracing::warn!(kind = kind.noun(), error = %e, "Native share failed, copying URL instead");
                }
            }
        }

        self.host
            .copy_to_clipboard(&payload.url)
            .await
            .map_err(|source| {
                tracing::error!(kind = kind.noun(), error = %source, "Share failed");
                GenerationError::ShareFailed { kind, source }
            })?;

        self.host
            .notify(&format!("{} URL copied to clipboard!", kind.title()));
        Ok(ShareOutcome::CopiedToClipboard)
    }
}

/// Decode any supported raster format and encode it as PNG.
fn reencode_png(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let mut out = Cursor::new(Vec::new());
    decoded.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
