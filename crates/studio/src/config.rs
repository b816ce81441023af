use std::path::PathBuf;

use seedream_client::ClientConfig;

/// Default directory holding persisted history and preferences.
pub const DEFAULT_DATA_DIR: &str = ".seedream";

/// Studio configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Root of the [`FileStore`](seedream_store::FileStore).
    pub data_dir: PathBuf,
    pub client: ClientConfig,
}

impl StudioConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default     |
    /// |---------------------|-------------|
    /// | `SEEDREAM_DATA_DIR` | `.seedream` |
    ///
    /// Webhook URLs and the download directory come from
    /// [`ClientConfig::from_env`].
    pub fn from_env() -> Self {
        let data_dir = std::env::var("SEEDREAM_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_DATA_DIR.into())
            .into();

        Self {
            data_dir,
            client: ClientConfig::from_env(),
        }
    }
}
