use std::path::PathBuf;

/// Default image-generation webhook.
pub const DEFAULT_IMAGE_WEBHOOK_URL: &str = "https://qb123.app.n8n.cloud/webhook-test/dream2image";
/// Default video-generation webhook.
pub const DEFAULT_VIDEO_WEBHOOK_URL: &str = "https://qb123.app.n8n.cloud/webhook-test/gen_video";
/// Default directory downloads are saved into.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Generation client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub image_webhook_url: String,
    pub video_webhook_url: String,
    /// Where [`DesktopHost`](crate::DesktopHost) saves downloads.
    pub download_dir: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                                                 |
    /// |------------------------------|---------------------------------------------------------|
    /// | `SEEDREAM_IMAGE_WEBHOOK_URL` | `https://qb123.app.n8n.cloud/webhook-test/dream2image`  |
    /// | `SEEDREAM_VIDEO_WEBHOOK_URL` | `https://qb123.app.n8n.cloud/webhook-test/gen_video`    |
    /// | `SEEDREAM_DOWNLOAD_DIR`      | `downloads`                                             |
    pub fn from_env() -> Self {
        let image_webhook_url = std::env::var("SEEDREAM_IMAGE_WEBHOOK_URL")
            .unwrap_or_else(|_| DEFAULT_IMAGE_WEBHOOK_URL.into());

        let video_webhook_url = std::env::var("SEEDREAM_VIDEO_WEBHOOK_URL")
            .unwrap_or_else(|_| DEFAULT_VIDEO_WEBHOOK_URL.into());

        let download_dir = std::env::var("SEEDREAM_DOWNLOAD_DIR")
            .unwrap_or_else(|_| DEFAULT_DOWNLOAD_DIR.into())
            .into();

        Self {
            image_webhook_url,
            video_webhook_url,
            download_dir,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            image_webhook_url: DEFAULT_IMAGE_WEBHOOK_URL.into(),
            video_webhook_url: DEFAULT_VIDEO_WEBHOOK_URL.into(),
            download_dir: DEFAULT_DOWNLOAD_DIR.into(),
        }
    }
}
