//! Canonical catalog models owned by the storefront, written by the
//! publish reconciler.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clementine_core::{CategoryId, MediaRef, ProductId};

/// A name-keyed taxonomy node. `parent_id` forms a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// The customer-facing catalog entity, after publish.
///
/// Matched by display `name` during publish: re-publishing a listing whose
/// name resolves to an existing product updates that product in place,
/// replacing its media wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Sanitized marketing detail HTML.
    pub detail_content: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub brand: String,
    pub category_id: CategoryId,
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
}

/// Everything the publish step writes into the canonical catalog, applied
/// atomically: either the whole draft lands (and the source listing is
/// marked imported) or nothing changes.
#[derive(Debug, Clone)]
pub struct CanonicalDraft {
    pub name: String,
    pub description: Option<String>,
    pub detail_content: String,
    pub price: Decimal,
    pub stock: i32,
    pub brand: String,
    pub category_id: CategoryId,
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
}
