//! Seedream domain types.
//!
//! Zero-I/O building blocks shared by the client, store and studio
//! crates: generation options, the generated artifact entities, id
//! minting, download filename conventions and the UI locale.

pub mod artifacts;
pub mod error;
pub mod generation;
pub mod locale;
pub mod naming;
pub mod types;

pub use artifacts::{ArtifactKind, GeneratedImage, GeneratedVideo};
pub use error::CoreError;
pub use generation::{Dimension, GenerationRequest, Quality, Style};
pub use locale::Language;
