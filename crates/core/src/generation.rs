//! Generation options and the request value object.
//!
//! The three option catalogues (style, dimension, quality) serialize to
//! the exact strings the generation webhooks expect, so the enums can be
//! embedded directly in outgoing payloads and in persisted history.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Visual style applied to a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    Cinematic,
    Photography,
    Anime,
    #[default]
    Cartoon,
    #[serde(rename = "Comic Book")]
    ComicBook,
    #[serde(rename = "Oil Painting")]
    OilPainting,
}

impl Style {
    /// Every style, in picker order.
    pub const ALL: [Style; 6] = [
        Style::Cinematic,
        Style::Photography,
        Style::Anime,
        Style::Cartoon,
        Style::ComicBook,
        Style::OilPainting,
    ];

    /// Wire value, which doubles as the display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Cinematic => "Cinematic",
            Style::Photography => "Photography",
            Style::Anime => "Anime",
            Style::Cartoon => "Cartoon",
            Style::ComicBook => "Comic Book",
            Style::OilPainting => "Oil Painting",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = CoreError;

    /// Accepts the wire label case-insensitively, and the snake_case form
    /// (`comic_book`) for command-line convenience.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', " ");
        Style::ALL
            .into_iter()
            .find(|style| style.as_str().to_lowercase() == normalized)
            .ok_or_else(|| unknown_value("style", s, Style::ALL.iter().map(|v| v.as_str())))
    }
}

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

/// Aspect-ratio preset for a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    #[serde(rename = "square")]
    Square,
    #[serde(rename = "square_hd")]
    SquareHd,
    #[serde(rename = "portrait_4_3")]
    Portrait4x3,
    #[serde(rename = "portrait_16_9")]
    Portrait16x9,
    #[serde(rename = "landscape_4_3")]
    Landscape4x3,
    #[serde(rename = "landscape_16_9")]
    Landscape16x9,
}

impl Dimension {
    /// Every dimension preset, in picker order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Square,
        Dimension::SquareHd,
        Dimension::Portrait4x3,
        Dimension::Portrait16x9,
        Dimension::Landscape4x3,
        Dimension::Landscape16x9,
    ];

    /// Wire value sent to the webhook.
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Square => "square",
            Dimension::SquareHd => "square_hd",
            Dimension::Portrait4x3 => "portrait_4_3",
            Dimension::Portrait16x9 => "portrait_16_9",
            Dimension::Landscape4x3 => "landscape_4_3",
            Dimension::Landscape16x9 => "landscape_16_9",
        }
    }

    /// Human-readable label shown in pickers.
    ///
    /// Portrait labels name the ratio as the user sees it (width:height),
    /// which is the inverse of the wire value.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Square => "Square",
            Dimension::SquareHd => "Square HD",
            Dimension::Portrait4x3 => "Portrait 3:4",
            Dimension::Portrait16x9 => "Portrait 9:16",
            Dimension::Landscape4x3 => "Landscape 4:3",
            Dimension::Landscape16x9 => "Landscape 9:16",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Dimension::ALL
            .into_iter()
            .find(|dim| dim.as_str() == normalized)
            .ok_or_else(|| {
                unknown_value("dimension", s, Dimension::ALL.iter().map(|v| v.as_str()))
            })
    }
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

/// Output resolution tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "1K")]
    OneK,
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::OneK, Quality::TwoK, Quality::FourK];

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::OneK => "1K",
            Quality::TwoK => "2K",
            Quality::FourK => "4K",
        }
    }

    /// Edge length in pixels for this tier.
    pub fn pixels(self) -> u32 {
        match self {
            Quality::OneK => 1024,
            Quality::TwoK => 2048,
            Quality::FourK => 4096,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == normalized)
            .ok_or_else(|| unknown_value("quality", s, Quality::ALL.iter().map(|v| v.as_str())))
    }
}

fn unknown_value<'a>(
    what: &str,
    got: &str,
    valid: impl Iterator<Item = &'a str>,
) -> CoreError {
    CoreError::Validation(format!(
        "Unknown {what}: '{got}'. Valid values: {}",
        valid.collect::<Vec<_>>().join(", ")
    ))
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// What the user asked for: one prompt plus the three picker options.
///
/// Immutable once built. Used for fresh generations and for retries
/// (see [`GeneratedImage::to_request`](crate::GeneratedImage::to_request)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: Style,
    pub dimension: Dimension,
    pub quality: Quality,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        style: Style,
        dimension: Dimension,
        quality: Quality,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            style,
            dimension,
            quality,
        }
    }

    /// Build a request with the picker defaults (Cartoon, square, 2K).
    pub fn with_defaults(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Style::default(), Dimension::default(), Quality::default())
    }

    /// Check the prompt and return a copy with surrounding whitespace
    /// removed.
    ///
    /// Callers run this before submitting; the generation client itself
    /// sends whatever it is given.
    pub fn validated(&self) -> Result<Self, CoreError> {
        let prompt = validate_prompt(&self.prompt)?;
        Ok(Self {
            prompt: prompt.to_string(),
            ..self.clone()
        })
    }
}

/// Validate that a prompt is non-empty after trimming. Returns the
/// trimmed prompt.
pub fn validate_prompt(prompt: &str) -> Result<&str, CoreError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Prompt must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
