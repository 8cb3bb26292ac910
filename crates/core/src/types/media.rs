//! Media references and the single normalization point for their storage
//! polymorphism.
//!
//! Listing media rows have historically been stored both as bare URL strings
//! and as `{"url": "..."}` objects. Every read boundary goes through
//! [`normalize_media`] so the rest of the system only ever sees
//! [`MediaRef`] values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to one image or video, by URL.
///
/// The URL is either a locally persisted path (e.g. `/uploads/<file>`) or,
/// when the download failed at import time, the original remote URL kept as
/// a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
}

impl MediaRef {
    /// Create a media reference from any URL-ish string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for MediaRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Normalize a stored media array into a list of [`MediaRef`]s.
///
/// Accepts both storage shapes observed in legacy rows:
/// - `["http://a/1.jpg", ...]` (bare strings)
/// - `[{"url": "http://a/1.jpg"}, ...]` (objects)
///
/// Entries that are empty strings, `null`, or objects without a string
/// `url` field are dropped. Anything that is not an array (including
/// `null`) normalizes to an empty list. Ordering is preserved.
#[must_use]
pub fn normalize_media(value: &Value) -> Vec<MediaRef> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(MediaRef::new(s)),
            Value::Object(obj) => match obj.get("url") {
                Some(Value::String(s)) if !s.is_empty() => Some(MediaRef::new(s)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Serialize media references to the canonical storage shape
/// (`[{"url": ...}]`).
#[must_use]
pub fn media_to_value(media: &[MediaRef]) -> Value {
    serde_json::to_value(media).unwrap_or_else(|_| Value::Array(Vec::new()))
}
