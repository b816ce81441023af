//! The single error kind surfaced by the generation client.
//!
//! Every variant's `Display` output is the message shown to the user, so
//! callers can render `err.to_string()` directly in an error banner.

use seedream_core::ArtifactKind;

use crate::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The webhook could not be reached at all (DNS, refused, timeout).
    #[error(
        "Network error: Unable to connect to {kind} generation service. \
         Please check your internet connection and try again."
    )]
    Network {
        kind: ArtifactKind,
        #[source]
        source: reqwest::Error,
    },

    /// The webhook answered with a non-2xx status code.
    #[error("{}: {status} - {body}", status_prefix(.kind))]
    Status {
        kind: ArtifactKind,
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response was JSON but carried no result URL in either
    /// accepted shape.
    #[error("No {kind} URL in response")]
    MissingField { kind: ArtifactKind },

    /// The response body was not JSON.
    #[error("Invalid response from {kind} generation service: {detail}")]
    MalformedResponse { kind: ArtifactKind, detail: String },

    /// Any other transport failure.
    #[error("Failed to generate {kind}. Please try again.")]
    Transport {
        kind: ArtifactKind,
        #[source]
        source: reqwest::Error,
    },

    /// No artifact with this id is known locally.
    #[error("{} not found", .kind.title())]
    NotFound { kind: ArtifactKind, id: String },

    /// Neither native sharing nor the clipboard fallback worked.
    #[error("Failed to share {kind}")]
    ShareFailed {
        kind: ArtifactKind,
        #[source]
        source: HostError,
    },

    /// Saving failed and the artifact could not be opened externally
    /// either.
    #[error("Failed to download {kind}")]
    DownloadFailed {
        kind: ArtifactKind,
        #[source]
        source: HostError,
    },
}

/// Leading text of a [`GenerationError::Status`] message.
fn status_prefix(kind: &ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Image => "Webhook request failed",
        ArtifactKind::Video => "Video generation webhook failed",
    }
}

impl GenerationError {
    /// Classify a `reqwest` send failure as connectivity or other.
    pub(crate) fn from_transport(kind: ArtifactKind, source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() {
            GenerationError::Network { kind, source }
        } else {
            GenerationError::Transport { kind, source }
        }
    }
}
