//! Integration test fixtures for the Clementine sourcing pipeline.
//!
//! Tests run the real [`Importer`] and [`Publisher`] over the in-memory
//! store, with a scripted copy model in place of the Gemini API. External
//! HTTP (asset downloads) is mocked per-test with `wiremock`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clementine-integration-tests
//! ```

use async_trait::async_trait;
use serde_json::{Value, json};

use clementine_sourcing::db::MemoryStore;
use clementine_sourcing::services::{
    AssetFetcher, CopyModel, GenerateError, Synthesizer, Translator,
};
use clementine_sourcing::{Importer, Publisher};

/// Copy model that replays a canned response (or a canned error).
pub struct ScriptedModel {
    response: Result<String, String>,
}

impl ScriptedModel {
    /// A model that always returns `body`.
    #[must_use]
    pub fn replying(body: impl Into<String>) -> Self {
        Self {
            response: Ok(body.into()),
        }
    }

    /// A model that always fails with a parse error.
    #[must_use]
    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }

    /// Well-formed copy for a two-image listing.
    #[must_use]
    pub fn standard_copy() -> Self {
        Self::replying(
            json!({
                "headlines": ["튼튼한 본체", "빠른 가열"],
                "subcopies": ["스테인리스 재질로 오래 씁니다.", "3분이면 끓습니다."],
                "specs": {"용량": "1.5L", "재질": "스테인리스"}
            })
            .to_string(),
        )
    }
}

#[async_trait]
impl CopyModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        match &self.response {
            Ok(body) => Ok(body.clone()),
            Err(message) => Err(GenerateError::Parse(message.clone())),
        }
    }
}

/// Importer over `store` with pass-through translation, assets stored
/// under `media_root`, and `model` as the copy model.
#[must_use]
pub fn importer(
    store: MemoryStore,
    media_root: &std::path::Path,
    model: ScriptedModel,
) -> Importer<MemoryStore, ScriptedModel> {
    Importer::new(
        store,
        Translator::new(None, "ko"),
        AssetFetcher::new(media_root),
        Some(Synthesizer::new(model)),
    )
}

/// Publisher over `store`.
#[must_use]
pub fn publisher(store: MemoryStore) -> Publisher<MemoryStore> {
    Publisher::new(store)
}

/// A scraper document shaped like real supplier output: two main images,
/// one SKU-prop image, and a price range string.
#[must_use]
pub fn sample_payload(image_base: &str) -> Value {
    json!({
        "title": "不锈钢水壶 1.5L",
        "productDescription": "加厚不锈钢电热水壶",
        "wholesale_price_model": {
            "final_price_model": {
                "trade_without_promotion": {"offer_min_price": "¥ 12.50 - 15.00"}
            }
        },
        "main_images": [
            {"full_path_image_u_r_i": format!("{image_base}/main-1.jpg")},
            {"full_path_image_u_r_i": format!("{image_base}/main-2.jpg")}
        ],
        "wholesale_skus": {
            "sku_props": [
                {"value": [{"image_url": format!("{image_base}/sku-red.jpg")}]}
            ]
        },
        "attributes": {"재질": "스테인리스", "용량": "1.5L"}
    })
}
