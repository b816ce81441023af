//! Generated artifact entities and id minting.
//!
//! Both entity kinds are created exactly once, on a successful webhook
//! response, and never mutated afterwards. Field names serialize in
//! camelCase so persisted history keeps the browser-era storage format.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::generation::{Dimension, GenerationRequest, Quality, Style};
use crate::types::{ArtifactId, Timestamp};

// ---------------------------------------------------------------------------
// Id minting
// ---------------------------------------------------------------------------

/// Id prefix for generated images.
pub const IMAGE_ID_PREFIX: &str = "img";
/// Id prefix for generated videos.
pub const VIDEO_ID_PREFIX: &str = "vid";

/// Length of the random suffix appended to every id.
pub const ID_SUFFIX_LENGTH: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mint an id of the form `<prefix>_<unix-millis>_<9 base36 chars>`.
///
/// Uniqueness is best-effort: two ids minted in the same millisecond
/// collide only if the random suffixes also match.
pub fn mint_id(prefix: &str) -> ArtifactId {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LENGTH)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{prefix}_{}_{suffix}", Utc::now().timestamp_millis())
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Which of the two artifact kinds an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

impl ArtifactKind {
    /// Lowercase noun used inside messages ("image", "video").
    pub fn noun(self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
        }
    }

    /// Capitalised noun used at the start of messages.
    pub fn title(self) -> &'static str {
        match self {
            ArtifactKind::Image => "Image",
            ArtifactKind::Video => "Video",
        }
    }

    /// Infer the kind from an id's prefix, if it carries a known one.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.split('_').next() {
            Some(IMAGE_ID_PREFIX) => Some(ArtifactKind::Image),
            Some(VIDEO_ID_PREFIX) => Some(ArtifactKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

// ---------------------------------------------------------------------------
// GeneratedImage
// ---------------------------------------------------------------------------

/// An image returned by the image-generation webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: ArtifactId,
    /// Remote location of the image.
    pub url: String,
    pub prompt: String,
    pub style: Style,
    pub dimension: Dimension,
    pub quality: Quality,
    pub created_at: Timestamp,
}

impl GeneratedImage {
    /// Create a new image for `request` with a fresh id and the current
    /// time.
    pub fn from_request(request: &GenerationRequest, url: impl Into<String>) -> Self {
        Self {
            id: mint_id(IMAGE_ID_PREFIX),
            url: url.into(),
            prompt: request.prompt.clone(),
            style: request.style,
            dimension: request.dimension,
            quality: request.quality,
            created_at: Utc::now(),
        }
    }

    /// The request that would regenerate this image.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest::new(self.prompt.clone(), self.style, self.dimension, self.quality)
    }
}

// ---------------------------------------------------------------------------
// GeneratedVideo
// ---------------------------------------------------------------------------

/// A video animated from a previously generated image.
///
/// `image_id` is a plain back-reference: the source image may later be
/// missing from history and nothing checks it. `image_url` is copied so
/// the video can be displayed without looking the image up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    pub id: ArtifactId,
    pub url: String,
    pub image_id: ArtifactId,
    pub image_url: String,
    pub prompt: String,
    pub style: Style,
    pub dimension: Dimension,
    pub quality: Quality,
    pub created_at: Timestamp,
}

impl GeneratedVideo {
    /// Create a new video sourced from `image`, copying every field it
    /// needs so later changes to `image` do not leak in.
    pub fn from_image(image: &GeneratedImage, url: impl Into<String>) -> Self {
        Self {
            id: mint_id(VIDEO_ID_PREFIX),
            url: url.into(),
            image_id: image.id.clone(),
            image_url: image.url.clone(),
            prompt: image.prompt.clone(),
            style: image.style,
            dimension: image.dimension,
            quality: image.quality,
            created_at: Utc::now(),
        }
    }
}
