//! The import pipeline: raw scraper document to staging listing.
//!
//! [`Importer`] wires extraction, translation, asset download, detail-page
//! generation, and image recovery over an injected store. Publishing to
//! the canonical catalog lives in [`crate::publish`].

use serde_json::Value;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use clementine_core::{ListingId, ListingStatus, MediaRef};

use crate::db::{CatalogStore, ListingStore, RepositoryError};
use crate::error::SourcingError;
use crate::extract::extract_listing;
use crate::models::{ListingDraft, ListingPatch, MANUAL_SOURCE_PLATFORM, SourcedListing};
use crate::services::{
    AssetFetcher, AssetKind, CopyModel, DetailPageInput, GenerateError, Synthesizer, Translator,
};

/// Currency recorded when the scraper document does not say otherwise.
const DEFAULT_CURRENCY: &str = "CNY";

/// One import request: a source URL plus the raw document scraped from it.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Supplier product page URL; the listing's identity.
    pub source_url: String,
    /// Raw scraper document.
    pub payload: Value,
    /// Pre-translated name supplied by the caller; skips the translation
    /// service when present.
    pub translated_name: Option<String>,
    /// Pre-translated description supplied by the caller.
    pub translated_description: Option<String>,
}

/// A listing entered by hand instead of scraped.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub name: String,
    pub description: Option<String>,
    pub price: rust_decimal::Decimal,
    /// Already-hosted image URLs or local paths.
    pub image_urls: Vec<String>,
}

/// What image recovery accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Remote URLs a re-download was attempted for.
    pub attempted: usize,
    /// Of those, how many landed on local storage.
    pub recovered: usize,
}

/// Runs the import pipeline against an injected store.
pub struct Importer<S, M> {
    store: S,
    translator: Translator,
    fetcher: AssetFetcher,
    synthesizer: Option<Synthesizer<M>>,
}

impl<S, M> Importer<S, M>
where
    S: ListingStore + CatalogStore,
    M: CopyModel,
{
    /// Wire up an importer.
    ///
    /// `synthesizer` may be `None` when no generation credentials are
    /// configured; only [`Importer::generate_detail`] requires it.
    pub const fn new(
        store: S,
        translator: Translator,
        fetcher: AssetFetcher,
        synthesizer: Option<Synthesizer<M>>,
    ) -> Self {
        Self {
            store,
            translator,
            fetcher,
            synthesizer,
        }
    }

    /// Import a scraped document as a staging listing.
    ///
    /// Creates the listing as `PENDING`, or refreshes it to `UPDATED` when
    /// the source URL was imported before. Validation failures reject the
    /// request before any network or storage side effect.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::InvalidInput`] for a missing/invalid source
    /// URL, a non-object payload, or a document without a title; storage
    /// failures are passed through.
    #[instrument(skip(self, request), fields(source_url = %request.source_url))]
    pub async fn import(&self, request: ImportRequest) -> Result<SourcedListing, SourcingError> {
        let source = Url::parse(&request.source_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| {
                SourcingError::InvalidInput("source_url must be an absolute http(s) URL".into())
            })?;
        if !request.payload.is_object() {
            return Err(SourcingError::InvalidInput(
                "payload must be a JSON object".into(),
            ));
        }

        let extracted = extract_listing(&request.payload);
        let Some(original_name) = extracted.title else {
            return Err(SourcingError::InvalidInput(
                "document carries no title".into(),
            ));
        };

        let translated_name = match request.translated_name {
            Some(name) if !name.is_empty() => name,
            _ => self.translator.translate(&original_name).await.into_text(),
        };
        let translated_description = match request.translated_description {
            Some(desc) if !desc.is_empty() => Some(desc),
            _ => match extracted.description.as_deref() {
                Some(desc) => Some(self.translator.translate(desc).await.into_text()),
                None => None,
            },
        };

        let images = self.fetch_media(&extracted.image_urls, AssetKind::Image).await;
        let videos = self.fetch_media(&extracted.video_urls, AssetKind::Video).await;

        let source_platform = source
            .host_str()
            .map_or_else(|| "unknown".to_string(), str::to_string);

        let draft = ListingDraft {
            source_url: request.source_url,
            source_platform,
            original_name,
            translated_name,
            original_description: extracted.description,
            translated_description,
            original_price: extracted.price,
            currency: DEFAULT_CURRENCY.to_string(),
            images,
            videos,
            attributes: extracted.attributes,
            initial_status: ListingStatus::Pending,
            original_payload: Some(request.payload),
        };

        let listing = self.store.upsert_listing(draft).await?;
        tracing::info!(listing_id = %listing.id, status = %listing.status, "listing imported");
        Ok(listing)
    }

    /// Register a hand-entered listing.
    ///
    /// The listing starts as `SOURCED` with the `manual` platform marker
    /// and a synthetic source URL, so it flows through the same review and
    /// publish steps as scraped listings.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::InvalidInput`] when the name is empty.
    #[instrument(skip(self, entry), fields(name = %entry.name))]
    pub async fn import_manual(&self, entry: ManualEntry) -> Result<SourcedListing, SourcingError> {
        if entry.name.trim().is_empty() {
            return Err(SourcingError::InvalidInput("name must not be empty".into()));
        }

        let draft = ListingDraft {
            source_url: format!("manual://{}", Uuid::new_v4()),
            source_platform: MANUAL_SOURCE_PLATFORM.to_string(),
            original_name: entry.name.clone(),
            translated_name: entry.name,
            original_description: entry.description.clone(),
            translated_description: entry.description,
            original_price: entry.price,
            currency: DEFAULT_CURRENCY.to_string(),
            images: entry.image_urls.into_iter().map(MediaRef::new).collect(),
            videos: Vec::new(),
            attributes: serde_json::Map::new(),
            initial_status: ListingStatus::Sourced,
            original_payload: None,
        };

        Ok(self.store.upsert_listing(draft).await?)
    }

    /// Apply an admin merge-patch to a listing.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::NotFound`] when the listing does not exist.
    pub async fn update_listing(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<SourcedListing, SourcingError> {
        self.store
            .update_listing(id, patch)
            .await
            .map_err(|e| not_found_as(e, id))
    }

    /// Generate detail-page HTML for a listing.
    ///
    /// Returns the rendered fragment without persisting it; the caller
    /// decides whether to store it via [`Importer::save_detail_content`].
    ///
    /// # Errors
    ///
    /// Fails when no generation credentials are configured, the listing
    /// does not exist, or the model request/response is unusable.
    #[instrument(skip(self))]
    pub async fn generate_detail(&self, id: ListingId) -> Result<String, SourcingError> {
        let Some(synthesizer) = self.synthesizer.as_ref() else {
            return Err(GenerateError::MissingCredentials.into());
        };
        let listing = self.require_listing(id).await?;

        // A display name equal to the original means translation never ran
        // (or fell back); give it another chance before generating copy.
        let name = if listing.translated_name == listing.original_name {
            self.translator
                .translate(&listing.original_name)
                .await
                .into_text()
        } else {
            listing.translated_name.clone()
        };
        let description = match (
            listing.translated_description,
            listing.original_description,
        ) {
            (Some(translated), _) => Some(translated),
            (None, Some(original)) => Some(self.translator.translate(&original).await.into_text()),
            (None, None) => None,
        };

        let input = DetailPageInput {
            name,
            description,
            images: listing.images,
            price: Some(listing.local_price),
            attributes: listing.attributes,
            source_platform: listing.source_platform,
        };
        Ok(synthesizer.generate(&input).await?)
    }

    /// Persist generated detail HTML on a listing.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::NotFound`] when the listing does not exist.
    pub async fn save_detail_content(
        &self,
        id: ListingId,
        html: &str,
    ) -> Result<(), SourcingError> {
        self.store
            .set_detail_content(id, html)
            .await
            .map_err(|e| not_found_as(e, id))
    }

    /// Re-download a listing's still-remote images to local storage.
    ///
    /// Images already on local paths are left alone; remote URLs are
    /// re-fetched best-effort, and the listing's image list is rewritten
    /// with whatever landed. When a canonical product with the listing's
    /// display name exists, its image associations are refreshed too.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::NotFound`] when the listing does not exist.
    #[instrument(skip(self))]
    pub async fn recover_images(&self, id: ListingId) -> Result<RecoveryOutcome, SourcingError> {
        let listing = self.require_listing(id).await?;

        let remote: Vec<String> = listing
            .images
            .iter()
            .map(|m| m.url.clone())
            .filter(|u| is_remote(u))
            .collect();
        if remote.is_empty() {
            return Ok(RecoveryOutcome {
                attempted: 0,
                recovered: 0,
            });
        }

        let fetched = self.fetcher.fetch_all(&remote, AssetKind::Image).await;
        let recovered = fetched.iter().filter(|f| f.is_downloaded()).count();

        // Rewrite the image list, swapping each recovered remote URL for
        // its local path and keeping everything else in place.
        let mut replacements = fetched.into_iter();
        let images: Vec<MediaRef> = listing
            .images
            .iter()
            .map(|m| {
                if is_remote(&m.url) {
                    replacements
                        .next()
                        .map_or_else(|| m.clone(), |f| MediaRef::new(f.effective_url()))
                } else {
                    m.clone()
                }
            })
            .collect();

        let patch = ListingPatch {
            images: Some(images.clone()),
            ..ListingPatch::default()
        };
        self.store
            .update_listing(id, patch)
            .await
            .map_err(|e| not_found_as(e, id))?;

        if let Some(product) = self
            .store
            .find_product_by_name(&listing.translated_name)
            .await?
        {
            self.store.replace_product_images(product.id, images).await?;
            tracing::info!(product_id = %product.id, "refreshed canonical product images");
        }

        Ok(RecoveryOutcome {
            attempted: remote.len(),
            recovered,
        })
    }

    async fn require_listing(&self, id: ListingId) -> Result<SourcedListing, SourcingError> {
        self.store
            .get_listing(id)
            .await?
            .ok_or_else(|| SourcingError::NotFound(format!("listing {id}")))
    }

    async fn fetch_media(&self, urls: &[String], kind: AssetKind) -> Vec<MediaRef> {
        self.fetcher
            .fetch_all(urls, kind)
            .await
            .iter()
            .map(|f| MediaRef::new(f.effective_url()))
            .collect()
    }
}

/// A URL the fetcher could conceivably re-download.
fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn not_found_as(e: RepositoryError, id: ListingId) -> SourcingError {
    match e {
        RepositoryError::NotFound => SourcingError::NotFound(format!("listing {id}")),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::db::MemoryStore;

    struct NoModel;

    #[async_trait]
    impl CopyModel for NoModel {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err(GenerateError::MissingCredentials)
        }
    }

    fn importer(store: MemoryStore) -> Importer<MemoryStore, NoModel> {
        let dir = std::env::temp_dir().join("clementine-pipeline-tests");
        Importer::new(store, Translator::new(None, "ko"), AssetFetcher::new(dir), None)
    }

    fn request(url: &str) -> ImportRequest {
        ImportRequest {
            source_url: url.to_string(),
            payload: json!({
                "title": "不锈钢水壶",
                "productDescription": "1.5L",
                "wholesale_price_model": {
                    "final_price_model": {
                        "trade_without_promotion": {"offer_min_price": "12.50"}
                    }
                }
            }),
            translated_name: Some("스테인리스 주전자".to_string()),
            translated_description: None,
        }
    }

    #[tokio::test]
    async fn test_import_creates_pending_listing() {
        let imp = importer(MemoryStore::new());
        let listing = imp
            .import(request("https://detail.1688.com/offer/1.html"))
            .await
            .expect("import failed");

        assert_eq!(listing.status, ListingStatus::Pending);
        assert_eq!(listing.source_platform, "detail.1688.com");
        assert_eq!(listing.original_name, "不锈钢水壶");
        assert_eq!(listing.translated_name, "스테인리스 주전자");
        assert_eq!(listing.original_price, Decimal::new(1250, 2));
        assert_eq!(listing.local_price, Decimal::new(1250, 2));
        assert_eq!(listing.currency, "CNY");
        assert!(listing.original_payload.is_some());
    }

    #[tokio::test]
    async fn test_reimport_becomes_updated() {
        let imp = importer(MemoryStore::new());
        let url = "https://detail.1688.com/offer/1.html";
        let first = imp.import(request(url)).await.expect("first import");
        let second = imp.import(request(url)).await.expect("second import");

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, ListingStatus::Updated);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_source_url() {
        let imp = importer(MemoryStore::new());
        let result = imp.import(request("detail.1688.com/offer/1.html")).await;
        assert!(matches!(result, Err(SourcingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_import_rejects_document_without_title() {
        let imp = importer(MemoryStore::new());
        let mut req = request("https://detail.1688.com/offer/1.html");
        req.payload = json!({"productDescription": "no title here"});
        req.translated_name = None;

        let result = imp.import(req).await;
        assert!(matches!(result, Err(SourcingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_manual_entry_starts_sourced() {
        let imp = importer(MemoryStore::new());
        let listing = imp
            .import_manual(ManualEntry {
                name: "수제 머그컵".to_string(),
                description: None,
                price: Decimal::new(9900, 0),
                image_urls: vec!["/uploads/mug.jpg".to_string()],
            })
            .await
            .expect("manual import failed");

        assert_eq!(listing.status, ListingStatus::Sourced);
        assert_eq!(listing.source_platform, MANUAL_SOURCE_PLATFORM);
        assert!(listing.source_url.starts_with("manual://"));
        assert_eq!(listing.images, vec![MediaRef::new("/uploads/mug.jpg")]);
    }

    #[tokio::test]
    async fn test_generate_detail_without_model_fails() {
        let imp = importer(MemoryStore::new());
        let listing = imp
            .import(request("https://detail.1688.com/offer/1.html"))
            .await
            .expect("import failed");

        let result = imp.generate_detail(listing.id).await;
        assert!(matches!(
            result,
            Err(SourcingError::Generation(GenerateError::MissingCredentials))
        ));
    }

    #[tokio::test]
    async fn test_recover_with_no_remote_images_is_a_noop() {
        let imp = importer(MemoryStore::new());
        let listing = imp
            .import_manual(ManualEntry {
                name: "수제 머그컵".to_string(),
                description: None,
                price: Decimal::new(9900, 0),
                image_urls: vec!["/uploads/mug.jpg".to_string()],
            })
            .await
            .expect("manual import failed");

        let outcome = imp.recover_images(listing.id).await.expect("recover failed");
        assert_eq!(
            outcome,
            RecoveryOutcome {
                attempted: 0,
                recovered: 0
            }
        );
    }
}
