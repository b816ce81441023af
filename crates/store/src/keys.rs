//! Durable storage keys.

/// Serialized list of generated images, newest first.
pub const GENERATED_IMAGES: &str = "generated-images";
/// Serialized list of generated videos, newest first.
pub const GENERATED_VIDEOS: &str = "generated-videos";
/// Two-letter UI language code.
pub const LANGUAGE: &str = "seedream-language";
