//! Seedream studio: the per-surface controller and the `seedream` CLI.
//!
//! A [`GenerationSession`] plays the role of one mounted surface. It
//! owns the surface's view of history, guards against overlapping
//! requests of the same kind, validates prompts, and keeps the error
//! banner the surface renders.

pub mod config;
pub mod error;
pub mod session;

pub use config::StudioConfig;
pub use error::SessionError;
pub use session::{FlowState, GenerationSession, SessionState};
