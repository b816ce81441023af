use seedream_client::GenerationError;
use seedream_core::{ArtifactKind, CoreError};
use seedream_store::StoreError;

/// Errors raised by a [`GenerationSession`](crate::GenerationSession).
///
/// `Display` is the text shown in the surface's error banner.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A flow of this kind is already requesting on this surface.
    #[error("A {0} generation is already in progress")]
    Busy(ArtifactKind),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
