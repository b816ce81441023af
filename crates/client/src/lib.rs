//! Seedream generation client.
//!
//! Sends generation requests to the image and video webhooks,
//! normalises their responses into [`GeneratedImage`] /
//! [`GeneratedVideo`] entities, and performs best-effort downloads and
//! shares through an injected [`Host`].
//!
//! [`GeneratedImage`]: seedream_core::GeneratedImage
//! [`GeneratedVideo`]: seedream_core::GeneratedVideo

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod payload;

pub use api::WebhookApi;
pub use client::{DownloadOutcome, GenerationClient, ShareOutcome};
pub use config::ClientConfig;
pub use error::GenerationError;
pub use host::{DesktopHost, Host, HostError, SharePayload};
