//! Re-import and admin-edit reconciliation behavior.

use rust_decimal::Decimal;

use clementine_core::ListingStatus;
use clementine_integration_tests::{ScriptedModel, importer, sample_payload};
use clementine_sourcing::db::{ListingStore, MemoryStore};
use clementine_sourcing::models::ListingPatch;
use clementine_sourcing::pipeline::ImportRequest;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(url: &str, payload: serde_json::Value) -> ImportRequest {
    ImportRequest {
        source_url: url.to_string(),
        payload,
        translated_name: Some("스테인리스 주전자".to_string()),
        translated_description: None,
    }
}

#[tokio::test]
async fn test_reimport_refreshes_scraped_fields_but_keeps_admin_edits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .mount(&server)
        .await;

    let media = tempfile::tempdir().expect("tempdir");
    let store = MemoryStore::new();
    let imp = importer(store.clone(), media.path(), ScriptedModel::standard_copy());
    let url = "https://detail.1688.com/offer/42.html";

    let first = imp
        .import(request(url, sample_payload(&server.uri())))
        .await
        .expect("first import");

    // Admin edits the sale price and stores hand-written detail HTML.
    store
        .update_listing(
            first.id,
            ListingPatch {
                local_price: Some(Decimal::new(19900, 0)),
                detail_content: Some("<div>hand written</div>".to_string()),
                ..ListingPatch::default()
            },
        )
        .await
        .expect("patch failed");

    // Supplier raised the price; re-import.
    let mut payload = sample_payload(&server.uri());
    payload["wholesale_price_model"]["final_price_model"]["trade_without_promotion"]
        ["offer_min_price"] = serde_json::json!("14.00");
    let second = imp.import(request(url, payload)).await.expect("second import");

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, ListingStatus::Updated);
    assert_eq!(second.original_price, Decimal::new(1400, 2));
    // Admin-owned fields survived the refresh.
    assert_eq!(second.local_price, Decimal::new(19900, 0));
    assert_eq!(second.detail_content.as_deref(), Some("<div>hand written</div>"));
}

#[tokio::test]
async fn test_failed_download_keeps_remote_url_without_aborting_import() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main-1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .mount(&server)
        .await;
    // main-2.jpg and sku-red.jpg are not mounted: the CDN lost them.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let media = tempfile::tempdir().expect("tempdir");
    let store = MemoryStore::new();
    let imp = importer(store.clone(), media.path(), ScriptedModel::standard_copy());

    let listing = imp
        .import(request(
            "https://detail.1688.com/offer/42.html",
            sample_payload(&server.uri()),
        ))
        .await
        .expect("import failed");

    assert_eq!(listing.images.len(), 3);
    assert!(listing.images[0].url.starts_with("/uploads/"));
    // The lost files fall back to their remote URLs, in position.
    assert_eq!(listing.images[1].url, format!("{}/main-2.jpg", server.uri()));
    assert_eq!(listing.images[2].url, format!("{}/sku-red.jpg", server.uri()));
}
