//! Staging listing models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use clementine_core::{ListingId, ListingStatus, MediaRef};

/// Marker used as `source_platform` for listings entered by hand rather
/// than scraped.
pub const MANUAL_SOURCE_PLATFORM: &str = "manual";

/// A staged, admin-editable representation of one scraped (or manually
/// entered) supplier product, prior to becoming a customer-facing product.
///
/// `source_url` is unique: re-importing the same URL refreshes this row
/// instead of inserting a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcedListing {
    pub id: ListingId,
    pub source_url: String,
    /// Hostname of the supplier site, or [`MANUAL_SOURCE_PLATFORM`].
    pub source_platform: String,
    pub original_name: String,
    /// Display name; equals `original_name` when translation was
    /// unavailable.
    pub translated_name: String,
    pub original_description: Option<String>,
    pub translated_description: Option<String>,
    /// Price as scraped from the supplier.
    pub original_price: Decimal,
    /// Admin-editable sale price; defaults to `original_price`.
    pub local_price: Decimal,
    /// ISO 4217 code of `original_price`.
    pub currency: String,
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
    /// Origin-defined key/value pairs, passed through unmodified.
    pub attributes: Map<String, Value>,
    /// Synthesized marketing detail HTML; `None` until generation runs.
    pub detail_content: Option<String>,
    pub status: ListingStatus,
    /// Raw scraper document, kept for re-extraction and debugging.
    pub original_payload: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by the import step when creating or refreshing a listing.
///
/// On refresh every scraped field here overwrites the stored row, but
/// `detail_content` and `local_price` set by prior admin edits are
/// preserved (the draft does not carry them).
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub source_url: String,
    pub source_platform: String,
    pub original_name: String,
    pub translated_name: String,
    pub original_description: Option<String>,
    pub translated_description: Option<String>,
    pub original_price: Decimal,
    pub currency: String,
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
    pub attributes: Map<String, Value>,
    /// Status applied on first insert; re-imports always become
    /// [`ListingStatus::Updated`].
    pub initial_status: ListingStatus,
    pub original_payload: Option<Value>,
}

/// Merge-patch for admin edits of a staging listing.
///
/// `None` fields are left untouched. An empty `images` list also means
/// "no change" - edits must never silently delete all media.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    pub translated_name: Option<String>,
    pub translated_description: Option<String>,
    pub local_price: Option<Decimal>,
    pub status: Option<ListingStatus>,
    pub detail_content: Option<String>,
    pub images: Option<Vec<MediaRef>>,
    pub videos: Option<Vec<MediaRef>>,
    pub attributes: Option<Map<String, Value>>,
}

impl ListingPatch {
    /// Whether the patch carries an image list that should actually be
    /// applied (non-empty; empty means "preserve existing").
    #[must_use]
    pub fn replaces_images(&self) -> bool {
        self.images.as_ref().is_some_and(|imgs| !imgs.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_patch_is_not_a_replacement() {
        let patch = ListingPatch {
            images: Some(Vec::new()),
            ..ListingPatch::default()
        };
        assert!(!patch.replaces_images());

        let patch = ListingPatch::default();
        assert!(!patch.replaces_images());

        let patch = ListingPatch {
            images: Some(vec![MediaRef::new("/uploads/a.jpg")]),
            ..ListingPatch::default()
        };
        assert!(patch.replaces_images());
    }
}
