//! Defensive field extraction from raw scraper documents.
//!
//! The scraper collaborator produces one JSON document per listing whose
//! shape is not contractually stable: suppliers change layouts, and the
//! scraper passes through whatever it finds. Extraction therefore probes a
//! small set of known locations and degrades to empty/default values
//! instead of failing on missing or malformed sub-structures.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// First decimal number embedded in arbitrary text, e.g. the `12.50` in
/// `"¥ 12.50 - 15.00"`.
static FIRST_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?").expect("valid price regex")
});

/// Fields pulled out of one scraper document.
///
/// All fields are best-effort; only the pipeline's input validation decides
/// which absences are fatal.
#[derive(Debug, Clone, Default)]
pub struct ExtractedListing {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Minimum offer price; `0` when absent or unparsable.
    pub price: Decimal,
    /// De-duplicated image URLs in first-seen order.
    pub image_urls: Vec<String>,
    pub video_urls: Vec<String>,
    /// Origin-defined attribute map, passed through unmodified.
    pub attributes: Map<String, Value>,
}

/// Extract listing fields from an arbitrary scraper document.
///
/// Never fails: every nested access degrades to an empty or default value.
#[must_use]
pub fn extract_listing(doc: &Value) -> ExtractedListing {
    ExtractedListing {
        title: string_at(doc, &["title"]),
        description: string_at(doc, &["productDescription"]),
        price: parse_price(pluck(
            doc,
            &[
                "wholesale_price_model",
                "final_price_model",
                "trade_without_promotion",
                "offer_min_price",
            ],
        )),
        image_urls: collect_image_urls(doc),
        video_urls: collect_string_array(doc, &["videoUrls"]),
        attributes: doc
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

/// Parse a price field that may be a JSON number or a string with a
/// decimal number embedded in other text (currency symbols, range text).
///
/// The first decimal number found wins; anything else yields zero.
#[must_use]
pub fn parse_price(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .map_or(Decimal::ZERO, |d| d.normalize())
            }
        }
        Some(Value::String(s)) => FIRST_DECIMAL
            .find(s)
            .and_then(|m| Decimal::from_str(m.as_str()).ok())
            .unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Collect image URLs from the known nesting locations:
///
/// - `main_images[].full_path_image_u_r_i` - the flat main-image list
/// - `wholesale_skus.sku_props[].value[].image_url` - per-variant swatches
///
/// Merged and de-duplicated by exact URL string, first occurrence wins.
fn collect_image_urls(doc: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    let mut push = |url: Option<&Value>| {
        if let Some(s) = url.and_then(Value::as_str)
            && !s.is_empty()
            && seen.insert(s.to_string())
        {
            urls.push(s.to_string());
        }
    };

    for image in array_at(doc, &["main_images"]) {
        push(image.get("full_path_image_u_r_i"));
    }

    for sku_prop in array_at(doc, &["wholesale_skus", "sku_props"]) {
        for value_item in sku_prop.get("value").and_then(Value::as_array).into_iter().flatten() {
            push(value_item.get("image_url"));
        }
    }

    urls
}

/// Walk a path of object keys, returning `None` as soon as any hop is
/// missing or not an object.
fn pluck<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(key))
}

fn string_at(doc: &Value, path: &[&str]) -> Option<String> {
    pluck(doc, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn array_at<'a>(doc: &'a Value, path: &[&str]) -> impl Iterator<Item = &'a Value> {
    pluck(doc, path)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn collect_string_array(doc: &Value, path: &[&str]) -> Vec<String> {
    array_at(doc, path)
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_full_supplier_document() {
        let doc = json!({
            "title": "Stainless Kettle",
            "productDescription": "1.5L kettle",
            "main_images": [
                {"full_path_image_u_r_i": "http://img/1.jpg"},
                {"full_path_image_u_r_i": "http://img/2.jpg"},
            ],
            "wholesale_skus": {
                "sku_props": [
                    {"value": [
                        {"image_url": "http://img/sku-red.jpg"},
                        {"name": "no image here"},
                    ]},
                ]
            },
            "wholesale_price_model": {
                "final_price_model": {
                    "trade_without_promotion": {"offer_min_price": "¥ 12.50 - 15.00"}
                }
            },
            "attributes": {"재질": "steel", "용량": "1.5L"},
            "videoUrls": ["http://img/demo.mp4"],
        });

        let extracted = extract_listing(&doc);
        assert_eq!(extracted.title.as_deref(), Some("Stainless Kettle"));
        assert_eq!(extracted.description.as_deref(), Some("1.5L kettle"));
        assert_eq!(extracted.price, Decimal::from_str("12.50").expect("decimal"));
        assert_eq!(
            extracted.image_urls,
            vec!["http://img/1.jpg", "http://img/2.jpg", "http://img/sku-red.jpg"]
        );
        assert_eq!(extracted.video_urls, vec!["http://img/demo.mp4"]);
        assert_eq!(extracted.attributes.len(), 2);
    }

    #[test]
    fn test_duplicate_image_urls_merged_first_seen_order() {
        let doc = json!({
            "main_images": [
                {"full_path_image_u_r_i": "http://img/1.jpg"},
                {"full_path_image_u_r_i": "http://img/1.jpg"},
            ],
            "wholesale_skus": {
                "sku_props": [
                    {"value": [{"image_url": "http://img/1.jpg"}, {"image_url": "http://img/2.jpg"}]},
                ]
            },
        });

        let extracted = extract_listing(&doc);
        assert_eq!(extracted.image_urls, vec!["http://img/1.jpg", "http://img/2.jpg"]);
    }

    #[test]
    fn test_empty_document_degrades_to_defaults() {
        let extracted = extract_listing(&json!({}));
        assert!(extracted.title.is_none());
        assert!(extracted.description.is_none());
        assert_eq!(extracted.price, Decimal::ZERO);
        assert!(extracted.image_urls.is_empty());
        assert!(extracted.video_urls.is_empty());
        assert!(extracted.attributes.is_empty());
    }

    #[test]
    fn test_malformed_substructures_do_not_panic() {
        let doc = json!({
            "title": 42,
            "main_images": "not-an-array",
            "wholesale_skus": {"sku_props": [{"value": "not-an-array"}, 7]},
            "wholesale_price_model": {"final_price_model": null},
            "attributes": ["not", "a", "map"],
            "videoUrls": [1, null, "http://v/ok.mp4"],
        });

        let extracted = extract_listing(&doc);
        assert!(extracted.title.is_none());
        assert!(extracted.image_urls.is_empty());
        assert_eq!(extracted.price, Decimal::ZERO);
        assert!(extracted.attributes.is_empty());
        assert_eq!(extracted.video_urls, vec!["http://v/ok.mp4"]);
    }

    #[test]
    fn test_price_range_string_takes_first_number() {
        let value = json!("¥ 12.50 - 15.00");
        assert_eq!(parse_price(Some(&value)), Decimal::from_str("12.50").expect("decimal"));
    }

    #[test]
    fn test_price_currency_prefix() {
        let value = json!("$9.99");
        assert_eq!(parse_price(Some(&value)), Decimal::from_str("9.99").expect("decimal"));
    }

    #[test]
    fn test_price_numeric_value() {
        assert_eq!(parse_price(Some(&json!(42))), Decimal::from(42));
        assert_eq!(
            parse_price(Some(&json!(12.5))),
            Decimal::from_str("12.5").expect("decimal")
        );
    }

    #[test]
    fn test_price_unparsable_defaults_to_zero() {
        assert_eq!(parse_price(Some(&json!("contact seller"))), Decimal::ZERO);
        assert_eq!(parse_price(Some(&json!(null))), Decimal::ZERO);
        assert_eq!(parse_price(None), Decimal::ZERO);
    }
}
