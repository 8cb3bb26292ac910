//! `PostgreSQL` store backend.
//!
//! Queries are runtime-checked (`sqlx::query_as` against explicit row
//! types) so the crate builds without a live database. The publish path is
//! the one multi-statement write in the system and runs inside a single
//! transaction: media-row replacement, product upsert, and the listing
//! status change land together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use clementine_core::{
    CategoryId, ListingId, ListingStatus, MediaRef, ProductId, media_to_value, normalize_media,
};

use crate::models::{CanonicalDraft, CanonicalProduct, Category, ListingDraft, ListingPatch, SourcedListing};

use super::{CatalogStore, ListingStore, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `sourced_listing` queries.
#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    source_url: String,
    source_platform: String,
    original_name: String,
    translated_name: String,
    original_description: Option<String>,
    translated_description: Option<String>,
    original_price: Decimal,
    local_price: Decimal,
    currency: String,
    images: Value,
    videos: Value,
    attributes: Value,
    detail_content: Option<String>,
    status: String,
    original_payload: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for SourcedListing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ListingStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: ListingId::from_uuid(row.id),
            source_url: row.source_url,
            source_platform: row.source_platform,
            original_name: row.original_name,
            translated_name: row.translated_name,
            original_description: row.original_description,
            translated_description: row.translated_description,
            original_price: row.original_price,
            local_price: row.local_price,
            currency: row.currency,
            // Reads tolerate legacy bare-string media rows.
            images: normalize_media(&row.images),
            videos: normalize_media(&row.videos),
            attributes: row
                .attributes
                .as_object()
                .cloned()
                .unwrap_or_default(),
            detail_content: row.detail_content,
            status,
            original_payload: row.original_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for `category` queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            parent_id: row.parent_id.map(CategoryId::from_uuid),
        }
    }
}

/// Internal row type for `product` queries (media loaded separately).
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    detail_content: Option<String>,
    price: Decimal,
    stock: i32,
    brand: String,
    category_id: Uuid,
}

const LISTING_COLUMNS: &str = "id, source_url, source_platform, original_name, translated_name, \
     original_description, translated_description, original_price, local_price, currency, \
     images, videos, attributes, detail_content, status, original_payload, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`ListingStore`] and [`CatalogStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_product_media(
        &self,
        product_id: Uuid,
        table: &str,
    ) -> Result<Vec<MediaRef>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT url FROM {table} WHERE product_id = $1 ORDER BY position"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(url,)| MediaRef::new(url)).collect())
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn upsert_listing(&self, draft: ListingDraft) -> Result<SourcedListing, RepositoryError> {
        // Admin-owned fields (local_price, detail_content) are deliberately
        // absent from the conflict update: a re-import must not clobber them.
        let row: ListingRow = sqlx::query_as(&format!(
            r"
            INSERT INTO sourced_listing
                (id, source_url, source_platform, original_name, translated_name,
                 original_description, translated_description, original_price, local_price,
                 currency, images, videos, attributes, status, original_payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (source_url) DO UPDATE SET
                source_platform = EXCLUDED.source_platform,
                original_name = EXCLUDED.original_name,
                translated_name = EXCLUDED.translated_name,
                original_description = EXCLUDED.original_description,
                translated_description = EXCLUDED.translated_description,
                original_price = EXCLUDED.original_price,
                currency = EXCLUDED.currency,
                images = EXCLUDED.images,
                videos = EXCLUDED.videos,
                attributes = EXCLUDED.attributes,
                original_payload = EXCLUDED.original_payload,
                status = 'UPDATED',
                updated_at = now()
            RETURNING {LISTING_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.source_url)
        .bind(&draft.source_platform)
        .bind(&draft.original_name)
        .bind(&draft.translated_name)
        .bind(&draft.original_description)
        .bind(&draft.translated_description)
        .bind(draft.original_price)
        .bind(&draft.currency)
        .bind(media_to_value(&draft.images))
        .bind(media_to_value(&draft.videos))
        .bind(Value::Object(draft.attributes.clone()))
        .bind(draft.initial_status.to_string())
        .bind(&draft.original_payload)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<SourcedListing>, RepositoryError> {
        let row: Option<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM sourced_listing WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_listing_by_source_url(
        &self,
        source_url: &str,
    ) -> Result<Option<SourcedListing>, RepositoryError> {
        let row: Option<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM sourced_listing WHERE source_url = $1"
        ))
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_listings(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SourcedListing>, RepositoryError> {
        let rows: Vec<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM sourced_listing
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_listings(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sourced_listing")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn update_listing(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<SourcedListing, RepositoryError> {
        let current = self
            .get_listing(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(status) = patch.status
            && !current.status.follows(status)
        {
            tracing::debug!(%id, from = %current.status, to = %status, "listing status moved backward");
        }

        // Empty incoming image list preserves the stored one (edits must
        // never silently delete all media).
        let images = patch
            .images
            .filter(|imgs| !imgs.is_empty())
            .map(|imgs| media_to_value(&imgs));
        let videos = patch.videos.map(|vids| media_to_value(&vids));
        let attributes = patch.attributes.map(Value::Object);

        let row: ListingRow = sqlx::query_as(&format!(
            r"
            UPDATE sourced_listing SET
                translated_name = COALESCE($2, translated_name),
                translated_description = COALESCE($3, translated_description),
                local_price = COALESCE($4, local_price),
                status = COALESCE($5, status),
                detail_content = COALESCE($6, detail_content),
                images = COALESCE($7, images),
                videos = COALESCE($8, videos),
                attributes = COALESCE($9, attributes),
                updated_at = now()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(patch.translated_name)
        .bind(patch.translated_description)
        .bind(patch.local_price)
        .bind(patch.status.map(|s| s.to_string()))
        .bind(patch.detail_content)
        .bind(images)
        .bind(videos)
        .bind(attributes)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn set_detail_content(&self, id: ListingId, html: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE sourced_listing SET detail_content = $2, updated_at = now() WHERE id = $1")
                .bind(id.as_uuid())
                .bind(html)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sourced_listing WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, parent_id FROM category WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, parent_id FROM category WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn create_category(
        &self,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO category (id, name, parent_id)
             VALUES ($1, $2, $3)
             RETURNING id, name, parent_id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(parent_id.map(|id| id.as_uuid()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("category name already exists: {name}"))
            }
            _ => RepositoryError::Database(e),
        })?;

        Ok(row.into())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CanonicalProduct>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, detail_content, price, stock, brand, category_id
             FROM product WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = self.load_product_media(row.id, "product_image").await?;
        let videos = self.load_product_media(row.id, "product_video").await?;

        Ok(Some(CanonicalProduct {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            detail_content: row.detail_content,
            price: row.price,
            stock: row.stock,
            brand: row.brand,
            category_id: CategoryId::from_uuid(row.category_id),
            images,
            videos,
        }))
    }

    async fn publish(
        &self,
        listing_id: ListingId,
        draft: CanonicalDraft,
    ) -> Result<CanonicalProduct, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM product WHERE name = $1")
            .bind(&draft.name)
            .fetch_optional(&mut *tx)
            .await?;

        let product_id = if let Some((id,)) = existing {
            // Old media association rows go first so the recreate below
            // always reflects the listing's current lists.
            sqlx::query("DELETE FROM product_image WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM product_video WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE product SET
                     name = $2, description = $3, detail_content = $4, price = $5,
                     stock = $6, brand = $7, category_id = $8, updated_at = now()
                 WHERE id = $1",
            )
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.detail_content)
            .bind(draft.price)
            .bind(draft.stock)
            .bind(&draft.brand)
            .bind(draft.category_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            id
        } else {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO product
                     (id, name, description, detail_content, price, stock, brand, category_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.detail_content)
            .bind(draft.price)
            .bind(draft.stock)
            .bind(&draft.brand)
            .bind(draft.category_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            id
        };

        for (position, image) in draft.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_image (id, product_id, url, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(&image.url)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }
        for (position, video) in draft.videos.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_video (id, product_id, url, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(&video.url)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        let marked =
            sqlx::query("UPDATE sourced_listing SET status = 'IMPORTED', updated_at = now() WHERE id = $1")
                .bind(listing_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        if marked.rows_affected() == 0 {
            // Dropping the transaction rolls back the product write.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(CanonicalProduct {
            id: ProductId::from_uuid(product_id),
            name: draft.name,
            description: draft.description,
            detail_content: Some(draft.detail_content),
            price: draft.price,
            stock: draft.stock,
            brand: draft.brand,
            category_id: draft.category_id,
            images: draft.images,
            videos: draft.videos,
        })
    }

    async fn replace_product_images(
        &self,
        product_id: ProductId,
        images: Vec<MediaRef>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_image WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for (position, image) in images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_image (id, product_id, url, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id.as_uuid())
            .bind(&image.url)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
