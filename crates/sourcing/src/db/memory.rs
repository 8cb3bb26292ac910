//! In-memory store backend.
//!
//! Used by tests and offline tooling in place of [`PgStore`]. Semantics
//! mirror the Postgres backend, including all-or-nothing publish: state is
//! only mutated once every step of a publish has succeeded, so an injected
//! failure leaves both the catalog and the listing untouched.
//!
//! [`PgStore`]: super::PgStore

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use clementine_core::{CategoryId, ListingId, ListingStatus, MediaRef, ProductId};

use crate::models::{CanonicalDraft, CanonicalProduct, Category, ListingDraft, ListingPatch, SourcedListing};

use super::{CatalogStore, ListingStore, RepositoryError};

#[derive(Default)]
struct Inner {
    listings: HashMap<ListingId, SourcedListing>,
    products: HashMap<ProductId, CanonicalProduct>,
    categories: HashMap<CategoryId, Category>,
    fail_next_publish: bool,
}

/// In-memory implementation of [`ListingStore`] and [`CatalogStore`].
///
/// Cloning yields a handle onto the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`CatalogStore::publish`] call fail without applying
    /// any changes. Test hook for publish-atomicity scenarios.
    pub async fn fail_next_publish(&self) {
        self.inner.lock().await.fail_next_publish = true;
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn upsert_listing(&self, draft: ListingDraft) -> Result<SourcedListing, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        let existing = inner
            .listings
            .values()
            .find(|l| l.source_url == draft.source_url)
            .map(|l| l.id);

        let listing = if let Some(id) = existing {
            let listing = inner
                .listings
                .get_mut(&id)
                .ok_or(RepositoryError::NotFound)?;
            if !listing.status.follows(ListingStatus::Updated) {
                tracing::debug!(%id, from = %listing.status, "re-import moves listing status backward");
            }
            listing.source_platform = draft.source_platform;
            listing.original_name = draft.original_name;
            listing.translated_name = draft.translated_name;
            listing.original_description = draft.original_description;
            listing.translated_description = draft.translated_description;
            listing.original_price = draft.original_price;
            listing.currency = draft.currency;
            listing.images = draft.images;
            listing.videos = draft.videos;
            listing.attributes = draft.attributes;
            listing.original_payload = draft.original_payload;
            listing.status = ListingStatus::Updated;
            listing.updated_at = now;
            listing.clone()
        } else {
            let listing = SourcedListing {
                id: ListingId::new(),
                source_url: draft.source_url,
                source_platform: draft.source_platform,
                original_name: draft.original_name,
                translated_name: draft.translated_name,
                original_description: draft.original_description,
                translated_description: draft.translated_description,
                original_price: draft.original_price,
                local_price: draft.original_price,
                currency: draft.currency,
                images: draft.images,
                videos: draft.videos,
                attributes: draft.attributes,
                detail_content: None,
                status: draft.initial_status,
                original_payload: draft.original_payload,
                created_at: now,
                updated_at: now,
            };
            inner.listings.insert(listing.id, listing.clone());
            listing
        };

        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<SourcedListing>, RepositoryError> {
        Ok(self.inner.lock().await.listings.get(&id).cloned())
    }

    async fn get_listing_by_source_url(
        &self,
        source_url: &str,
    ) -> Result<Option<SourcedListing>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .listings
            .values()
            .find(|l| l.source_url == source_url)
            .cloned())
    }

    async fn list_listings(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SourcedListing>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut listings: Vec<_> = inner.listings.values().cloned().collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_listings(&self) -> Result<u64, RepositoryError> {
        Ok(self.inner.lock().await.listings.len() as u64)
    }

    async fn update_listing(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<SourcedListing, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = patch.translated_name {
            listing.translated_name = name;
        }
        if let Some(description) = patch.translated_description {
            listing.translated_description = Some(description);
        }
        if let Some(price) = patch.local_price {
            listing.local_price = price;
        }
        if let Some(status) = patch.status {
            if !listing.status.follows(status) {
                tracing::debug!(%id, from = %listing.status, to = %status, "listing status moved backward");
            }
            listing.status = status;
        }
        if let Some(html) = patch.detail_content {
            listing.detail_content = Some(html);
        }
        // Empty incoming image list preserves the stored one.
        if let Some(images) = patch.images.filter(|imgs| !imgs.is_empty()) {
            listing.images = images;
        }
        if let Some(videos) = patch.videos {
            listing.videos = videos;
        }
        if let Some(attributes) = patch.attributes {
            listing.attributes = attributes;
        }
        listing.updated_at = Utc::now();

        Ok(listing.clone())
    }

    async fn set_detail_content(&self, id: ListingId, html: &str) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        listing.detail_content = Some(html.to_string());
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<(), RepositoryError> {
        self.inner
            .lock()
            .await
            .listings
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.inner.lock().await.categories.get(&id).cloned())
    }

    async fn create_category(
        &self,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.categories.values().any(|c| c.name == name) {
            return Err(RepositoryError::Conflict(format!(
                "category name already exists: {name}"
            )));
        }
        let category = Category {
            id: CategoryId::new(),
            name: name.to_string(),
            parent_id,
        };
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_product_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CanonicalProduct>, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .products
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn publish(
        &self,
        listing_id: ListingId,
        draft: CanonicalDraft,
    ) -> Result<CanonicalProduct, RepositoryError> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_publish {
            inner.fail_next_publish = false;
            return Err(RepositoryError::Storage(
                "injected publish failure".to_string(),
            ));
        }

        if !inner.listings.contains_key(&listing_id) {
            return Err(RepositoryError::NotFound);
        }
        if !inner.categories.contains_key(&draft.category_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown category: {}",
                draft.category_id
            )));
        }

        // All checks passed; apply the whole draft in one go.
        let id = inner
            .products
            .values()
            .find(|p| p.name == draft.name)
            .map_or_else(ProductId::new, |p| p.id);

        let product = CanonicalProduct {
            id,
            name: draft.name,
            description: draft.description,
            detail_content: Some(draft.detail_content),
            price: draft.price,
            stock: draft.stock,
            brand: draft.brand,
            category_id: draft.category_id,
            images: draft.images,
            videos: draft.videos,
        };
        inner.products.insert(id, product.clone());

        if let Some(listing) = inner.listings.get_mut(&listing_id) {
            listing.status = ListingStatus::Imported;
            listing.updated_at = Utc::now();
        }

        Ok(product)
    }

    async fn replace_product_images(
        &self,
        product_id: ProductId,
        images: Vec<MediaRef>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let product = inner
            .products
            .get_mut(&product_id)
            .ok_or(RepositoryError::NotFound)?;
        product.images = images;
        Ok(())
    }
}
