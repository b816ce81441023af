//! Webhook request bodies and response normalisation.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use seedream_core::{Dimension, GeneratedImage, GenerationRequest, Quality, Style};

use seedream_core::types::Timestamp;

/// Response field carrying the generated image location.
pub const IMAGE_URL_FIELD: &str = "imageUrl";
/// Response field carrying the generated video location.
pub const VIDEO_URL_FIELD: &str = "videoUrl";

/// ISO-8601 with millisecond precision and a `Z` suffix.
fn iso_millis(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body posted to the image-generation webhook.
#[derive(Debug, Serialize)]
pub struct ImagePayload<'a> {
    pub prompt: &'a str,
    pub style: Style,
    pub dimension: Dimension,
    pub quality: Quality,
    pub timestamp: String,
}

impl<'a> ImagePayload<'a> {
    pub fn new(request: &'a GenerationRequest) -> Self {
        Self {
            prompt: &request.prompt,
            style: request.style,
            dimension: request.dimension,
            quality: request.quality,
            timestamp: iso_millis(Utc::now()),
        }
    }
}

/// Body posted to the video-generation webhook.
///
/// Carries every field of the source image, twice: flat, and again
/// under `userInputData`, so the remote workflow never has to look the
/// image up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image_url: &'a str,
    pub image_id: &'a str,
    pub prompt: &'a str,
    pub style: Style,
    pub dimension: Dimension,
    pub quality: Quality,
    pub timestamp: String,
    pub user_input_data: UserInputData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputData<'a> {
    pub original_prompt: &'a str,
    pub selected_style: Style,
    pub selected_dimension: Dimension,
    pub selected_quality: Quality,
    pub generated_image_url: &'a str,
    pub created_at: String,
}

impl<'a> VideoPayload<'a> {
    pub fn new(image: &'a GeneratedImage) -> Self {
        Self {
            kind: "video",
            image_url: &image.url,
            image_id: &image.id,
            prompt: &image.prompt,
            style: image.style,
            dimension: image.dimension,
            quality: image.quality,
            timestamp: iso_millis(Utc::now()),
            user_input_data: UserInputData {
                original_prompt: &image.prompt,
                selected_style: image.style,
                selected_dimension: image.dimension,
                selected_quality: image.quality,
                generated_image_url: &image.url,
                created_at: iso_millis(image.created_at),
            },
        }
    }
}

/// Pull the result URL out of a webhook response.
///
/// Two shapes are accepted: a non-empty array whose first element holds
/// `field`, or a bare object holding `field`. The value must be a
/// non-empty string. Anything else yields `None`.
pub fn extract_result_url(body: &serde_json::Value, field: &str) -> Option<String> {
    let holder = match body {
        serde_json::Value::Array(items) => items.first()?,
        serde_json::Value::Object(_) => body,
        _ => return None,
    };
    holder
        .get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
