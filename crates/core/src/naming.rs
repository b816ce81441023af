//! Download filename convention.
//!
//! Generates the filename an artifact is saved under, derived from its
//! prompt and the download date.

use chrono::NaiveDate;

/// Maximum number of prompt characters kept in a filename.
pub const PROMPT_SLUG_MAX_CHARS: usize = 30;

/// Reduce a prompt to a filename-safe slug.
///
/// Drops everything except ASCII letters, digits and whitespace, keeps
/// the first [`PROMPT_SLUG_MAX_CHARS`] characters, trims, and joins the
/// remaining words with `-`.
///
/// # Examples
///
/// ```
/// use seedream_core::naming::prompt_slug;
///
/// assert_eq!(prompt_slug("A cat, on a roof!"), "A-cat-on-a-roof");
/// assert_eq!(prompt_slug("  spaced   out  "), "spaced-out");
/// ```
pub fn prompt_slug(prompt: &str) -> String {
    let kept: String = prompt
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .take(PROMPT_SLUG_MAX_CHARS)
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Filename for a downloaded image: `seedream-<slug>-<yyyy-mm-dd>.png`.
///
/// ```
/// use chrono::NaiveDate;
/// use seedream_core::naming::image_filename;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(image_filename("red fox", date), "seedream-red-fox-2024-03-09.png");
/// ```
pub fn image_filename(prompt: &str, date: NaiveDate) -> String {
    format!("seedream-{}-{}.png", prompt_slug(prompt), date.format("%Y-%m-%d"))
}

/// Filename for a downloaded video: `seedream-video-<slug>-<yyyy-mm-dd>.mp4`.
pub fn video_filename(prompt: &str, date: NaiveDate) -> String {
    format!(
        "seedream-video-{}-{}.mp4",
        prompt_slug(prompt),
        date.format("%Y-%m-%d")
    )
}
