//! Promotes a finished staging listing into the canonical catalog.

use rust_decimal::Decimal;
use tracing::instrument;

use clementine_core::{CategoryId, ListingId};

use crate::db::{CatalogStore, ListingStore, RepositoryError};
use crate::error::SourcingError;
use crate::models::{CanonicalDraft, CanonicalProduct};
use crate::services::sanitize_detail_content;

/// Category a listing lands in when the caller does not pick one.
const DEFAULT_CATEGORY: &str = "구매대행";
/// Stock level assigned at publish; inventory management happens later.
const DEFAULT_STOCK: i32 = 100;
const DEFAULT_BRAND: &str = "Unknown";

/// Publishes staging listings as canonical products.
pub struct Publisher<S> {
    store: S,
}

impl<S> Publisher<S>
where
    S: ListingStore + CatalogStore,
{
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Publish a listing into the canonical catalog.
    ///
    /// Preconditions are checked before anything is written: the listing
    /// needs a non-empty display name, a sale price, and generated detail
    /// content. The catalog write itself is atomic; on any failure the
    /// product and the listing are left exactly as they were.
    ///
    /// With no `category_id` the listing lands in the default sourcing
    /// category, created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::NotFound`] for a missing listing or
    /// category, [`SourcingError::Incomplete`] when a precondition fails,
    /// and storage errors otherwise.
    #[instrument(skip(self), fields(listing_id = %listing_id))]
    pub async fn publish(
        &self,
        listing_id: ListingId,
        category_id: Option<CategoryId>,
    ) -> Result<CanonicalProduct, SourcingError> {
        let listing = self
            .store
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| SourcingError::NotFound(format!("listing {listing_id}")))?;

        if listing.translated_name.trim().is_empty() {
            return Err(SourcingError::Incomplete(
                "listing has no display name".into(),
            ));
        }
        // Price extraction degrades to zero; that is fine for staging but a
        // catalog product must carry a real sale price.
        if listing.local_price <= Decimal::ZERO {
            return Err(SourcingError::Incomplete(
                "listing has no sale price".into(),
            ));
        }
        let Some(detail_content) = listing.detail_content.as_deref() else {
            return Err(SourcingError::Incomplete(
                "detail content has not been generated".into(),
            ));
        };

        let category_id = match category_id {
            Some(id) => {
                self.store
                    .get_category(id)
                    .await?
                    .ok_or_else(|| SourcingError::NotFound(format!("category {id}")))?
                    .id
            }
            None => self.default_category().await?,
        };

        // Name collisions update the existing product in place; surface
        // that so an accidental overwrite is at least visible in the logs.
        if let Some(existing) = self
            .store
            .find_product_by_name(&listing.translated_name)
            .await?
        {
            tracing::warn!(
                product_id = %existing.id,
                name = %listing.translated_name,
                "publish will overwrite an existing product with the same name"
            );
        }

        let draft = CanonicalDraft {
            name: listing.translated_name.clone(),
            description: listing
                .translated_description
                .clone()
                .or_else(|| listing.original_description.clone()),
            detail_content: sanitize_detail_content(detail_content),
            price: listing.local_price,
            stock: DEFAULT_STOCK,
            brand: DEFAULT_BRAND.to_string(),
            category_id,
            images: listing.images.clone(),
            videos: listing.videos.clone(),
        };

        let product = self.store.publish(listing_id, draft).await?;
        tracing::info!(product_id = %product.id, "listing published");
        Ok(product)
    }

    async fn default_category(&self) -> Result<CategoryId, SourcingError> {
        if let Some(category) = self.store.find_category_by_name(DEFAULT_CATEGORY).await? {
            return Ok(category.id);
        }
        match self.store.create_category(DEFAULT_CATEGORY, None).await {
            Ok(category) => Ok(category.id),
            // Lost a creation race; the other writer's row is fine.
            Err(RepositoryError::Conflict(_)) => self
                .store
                .find_category_by_name(DEFAULT_CATEGORY)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| SourcingError::NotFound("default category".into())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    use clementine_core::ListingStatus;

    use crate::db::MemoryStore;
    use crate::models::{ListingDraft, ListingPatch};

    async fn staged_listing(store: &MemoryStore, with_detail: bool) -> ListingId {
        let listing = store
            .upsert_listing(ListingDraft {
                source_url: "https://detail.1688.com/offer/9.html".to_string(),
                source_platform: "detail.1688.com".to_string(),
                original_name: "不锈钢水壶".to_string(),
                translated_name: "스테인리스 주전자".to_string(),
                original_description: None,
                translated_description: Some("1.5L 주전자".to_string()),
                original_price: Decimal::new(1250, 2),
                currency: "CNY".to_string(),
                images: vec![clementine_core::MediaRef::new("/uploads/a.jpg")],
                videos: Vec::new(),
                attributes: serde_json::Map::new(),
                initial_status: ListingStatus::Pending,
                original_payload: Some(json!({})),
            })
            .await
            .expect("upsert failed");

        if with_detail {
            store
                .set_detail_content(listing.id, "<div><p style=\"color:red\">copy</p></div>")
                .await
                .expect("set detail failed");
        }
        listing.id
    }

    #[tokio::test]
    async fn test_publish_creates_product_and_marks_imported() {
        let store = MemoryStore::new();
        let id = staged_listing(&store, true).await;

        let product = Publisher::new(store.clone())
            .publish(id, None)
            .await
            .expect("publish failed");

        assert_eq!(product.name, "스테인리스 주전자");
        assert_eq!(product.stock, 100);
        assert_eq!(product.brand, "Unknown");
        // Inline styles are stripped before the catalog sees the HTML.
        assert_eq!(
            product.detail_content.as_deref(),
            Some("<div><p>copy</p></div>")
        );

        let listing = store
            .get_listing(id)
            .await
            .expect("get failed")
            .expect("listing gone");
        assert_eq!(listing.status, ListingStatus::Imported);

        let category = store
            .find_category_by_name(DEFAULT_CATEGORY)
            .await
            .expect("find failed")
            .expect("default category missing");
        assert_eq!(product.category_id, category.id);
    }

    #[tokio::test]
    async fn test_publish_requires_detail_content() {
        let store = MemoryStore::new();
        let id = staged_listing(&store, false).await;

        let result = Publisher::new(store.clone()).publish(id, None).await;
        assert!(matches!(result, Err(SourcingError::Incomplete(_))));

        // Nothing was written.
        let listing = store
            .get_listing(id)
            .await
            .expect("get failed")
            .expect("listing gone");
        assert_eq!(listing.status, ListingStatus::Pending);
        assert!(
            store
                .find_product_by_name("스테인리스 주전자")
                .await
                .expect("find failed")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_publish_requires_positive_price() {
        let store = MemoryStore::new();
        let listing = store
            .upsert_listing(ListingDraft {
                source_url: "https://detail.1688.com/offer/10.html".to_string(),
                source_platform: "detail.1688.com".to_string(),
                original_name: "保温杯".to_string(),
                translated_name: "보온 텀블러".to_string(),
                original_description: None,
                translated_description: None,
                // Unparsable supplier price degrades to zero at import.
                original_price: Decimal::ZERO,
                currency: "CNY".to_string(),
                images: Vec::new(),
                videos: Vec::new(),
                attributes: serde_json::Map::new(),
                initial_status: ListingStatus::Pending,
                original_payload: Some(json!({})),
            })
            .await
            .expect("upsert failed");
        store
            .set_detail_content(listing.id, "<div><p>copy</p></div>")
            .await
            .expect("set detail failed");

        let result = Publisher::new(store.clone()).publish(listing.id, None).await;
        assert!(matches!(result, Err(SourcingError::Incomplete(_))));
        assert!(
            store
                .find_product_by_name("보온 텀블러")
                .await
                .expect("find failed")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_publish_rejects_unknown_category() {
        let store = MemoryStore::new();
        let id = staged_listing(&store, true).await;

        let result = Publisher::new(store)
            .publish(id, Some(clementine_core::CategoryId::new()))
            .await;
        assert!(matches!(result, Err(SourcingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_republish_updates_product_in_place() {
        let store = MemoryStore::new();
        let id = staged_listing(&store, true).await;
        let publisher = Publisher::new(store.clone());

        let first = publisher.publish(id, None).await.expect("first publish");

        store
            .update_listing(
                id,
                ListingPatch {
                    local_price: Some(Decimal::new(19900, 0)),
                    ..ListingPatch::default()
                },
            )
            .await
            .expect("patch failed");

        let second = publisher.publish(id, None).await.expect("second publish");
        assert_eq!(first.id, second.id);
        assert_eq!(second.price, Decimal::new(19900, 0));
    }

    #[tokio::test]
    async fn test_failed_publish_changes_nothing() {
        let store = MemoryStore::new();
        let id = staged_listing(&store, true).await;
        store.fail_next_publish().await;

        let result = Publisher::new(store.clone()).publish(id, None).await;
        assert!(result.is_err());

        let listing = store
            .get_listing(id)
            .await
            .expect("get failed")
            .expect("listing gone");
        assert_eq!(listing.status, ListingStatus::Pending);
        assert!(
            store
                .find_product_by_name("스테인리스 주전자")
                .await
                .expect("find failed")
                .is_none()
        );
    }
}
