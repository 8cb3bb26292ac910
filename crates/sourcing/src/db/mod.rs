//! Storage for staging listings and the canonical catalog.
//!
//! # Tables
//!
//! - `sourced_listing` - staging rows, unique by `source_url`
//! - `product` / `product_image` / `product_video` - canonical catalog
//! - `category` - name-keyed taxonomy tree
//!
//! # Migrations
//!
//! Migrations are stored in `crates/sourcing/migrations/` and run via:
//! ```bash
//! cargo run -p clementine-cli -- migrate
//! ```
//!
//! # Backends
//!
//! Stores are injected through the [`ListingStore`] and [`CatalogStore`]
//! traits rather than a module-level client, so tests can substitute
//! [`MemoryStore`] for [`PgStore`].

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use clementine_core::{CategoryId, ListingId, MediaRef, ProductId};

use crate::models::{CanonicalDraft, CanonicalProduct, Category, ListingDraft, ListingPatch, SourcedListing};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Embedded migrations for the sourcing schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate product name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Backend-specific storage failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Storage contract for staging listings.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Create or refresh a listing keyed by `source_url`.
    ///
    /// On first import the row is created with `draft.initial_status`. On
    /// re-import of an existing `source_url`, scraped fields are
    /// overwritten and the status becomes `UPDATED`, while admin-owned
    /// fields (`local_price`, `detail_content`) are preserved.
    async fn upsert_listing(&self, draft: ListingDraft) -> Result<SourcedListing, RepositoryError>;

    /// Fetch a listing by id.
    async fn get_listing(&self, id: ListingId) -> Result<Option<SourcedListing>, RepositoryError>;

    /// Fetch a listing by its source URL.
    async fn get_listing_by_source_url(
        &self,
        source_url: &str,
    ) -> Result<Option<SourcedListing>, RepositoryError>;

    /// List listings, newest first.
    async fn list_listings(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SourcedListing>, RepositoryError>;

    /// Total number of listings.
    async fn count_listings(&self) -> Result<u64, RepositoryError>;

    /// Apply a merge-patch to a listing.
    ///
    /// `None` fields are untouched; an empty incoming image list preserves
    /// the stored one. Returns the updated listing.
    async fn update_listing(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<SourcedListing, RepositoryError>;

    /// Store generated detail HTML without touching the status.
    async fn set_detail_content(&self, id: ListingId, html: &str) -> Result<(), RepositoryError>;

    /// Delete a listing.
    async fn delete_listing(&self, id: ListingId) -> Result<(), RepositoryError>;
}

/// Storage contract for the canonical catalog written at publish time.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Find a category by exact name.
    async fn find_category_by_name(&self, name: &str)
    -> Result<Option<Category>, RepositoryError>;

    /// Fetch a category by id.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Create a category.
    async fn create_category(
        &self,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError>;

    /// Find a canonical product by exact display name.
    async fn find_product_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CanonicalProduct>, RepositoryError>;

    /// Promote a listing into the canonical catalog, atomically.
    ///
    /// Upserts the product matched by `draft.name`, replaces its media
    /// associations wholesale, and marks the listing `IMPORTED` - all
    /// within a single transaction. On error nothing is changed: the
    /// product keeps its previous media set and the listing keeps its
    /// previous status.
    async fn publish(
        &self,
        listing_id: ListingId,
        draft: CanonicalDraft,
    ) -> Result<CanonicalProduct, RepositoryError>;

    /// Replace a product's image associations in one atomic step.
    ///
    /// Used by image recovery; never leaves the product with a partial
    /// image set.
    async fn replace_product_images(
        &self,
        product_id: ProductId,
        images: Vec<MediaRef>,
    ) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
