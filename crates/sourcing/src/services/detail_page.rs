//! Detail-page copy synthesis and HTML rendering.
//!
//! Asks a [`CopyModel`] for structured marketing copy (headlines and
//! subcopies paired to the listing's images, plus a spec table), then
//! renders it into a self-contained HTML fragment. Copy generation is
//! strict: a response that does not parse as the expected JSON shape is a
//! hard error, never a half-rendered page.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use clementine_core::MediaRef;

use super::gemini::{CopyModel, GenerateError};

/// Heading above the specification table.
const SPECS_HEADING: &str = "제품 제원";

static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" style="[^"]*""#).expect("valid style regex"));
static DOC_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!DOCTYPE html>.*?<body[^>]*>").expect("valid head regex"));
static DOC_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</body>.*?</html>").expect("valid tail regex"));

/// Everything the synthesizer needs to know about a listing.
#[derive(Debug, Clone)]
pub struct DetailPageInput {
    /// Display name (translated when available)
    pub name: String,
    /// Display description (translated when available)
    pub description: Option<String>,
    /// Image refs in display order
    pub images: Vec<MediaRef>,
    /// Selling price, if already decided
    pub price: Option<Decimal>,
    /// Raw attribute key/values from the source document
    pub attributes: Map<String, Value>,
    /// Where the listing came from
    pub source_platform: String,
}

/// Structured copy returned by the model.
#[derive(Debug, Clone, Deserialize)]
struct DetailCopy {
    headlines: Vec<String>,
    subcopies: Vec<String>,
    #[serde(default)]
    specs: Map<String, Value>,
}

/// Generates detail-page HTML for a listing.
pub struct Synthesizer<M> {
    model: M,
}

impl<M: CopyModel> Synthesizer<M> {
    /// Create a synthesizer backed by `model`.
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// Generate detail-page HTML for `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model request fails or its response is not
    /// the expected JSON shape.
    #[instrument(skip(self, input), fields(name = %input.name, images = input.images.len()))]
    pub async fn generate(&self, input: &DetailPageInput) -> Result<String, GenerateError> {
        let prompt = build_prompt(input);
        let raw = self.model.generate(&prompt).await?;
        let copy: DetailCopy = serde_json::from_str(&raw)
            .map_err(|e| GenerateError::Parse(format!("Copy response is not valid JSON: {e}")))?;
        Ok(render_html(input, &copy))
    }
}

fn build_prompt(input: &DetailPageInput) -> String {
    let section_count = input.images.len().max(1);
    let description = input.description.as_deref().unwrap_or("(no description)");
    let price = input
        .price
        .map_or_else(|| "(undecided)".to_string(), |p| p.to_string());
    let attributes =
        serde_json::to_string(&input.attributes).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are a copywriter for a Korean e-commerce store selling products \
         sourced from overseas platforms.\n\
         Write detail-page copy in Korean for the product below.\n\n\
         Name: {name}\n\
         Description: {description}\n\
         Price: {price}\n\
         Source platform: {platform}\n\
         Attributes: {attributes}\n\n\
         Respond with a single JSON object, nothing else:\n\
         {{\n\
           \"headlines\": [exactly {n} short punchy section headlines],\n\
           \"subcopies\": [exactly {n} one-to-two sentence supporting paragraphs, \
         one per headline],\n\
           \"specs\": {{key/value pairs of product specifications in Korean}}\n\
         }}\n\
         Do not invent customer reviews or ratings. Do not mention the source \
         platform in the copy.",
        name = input.name,
        description = description,
        price = price,
        platform = input.source_platform,
        attributes = attributes,
        n = section_count,
    )
}

/// Render copy and images into one `<div>`-wrapped fragment.
///
/// Each image gets a headline, a subcopy paragraph, and the image itself;
/// positions past the shorter of the three lists are dropped silently. A
/// non-empty spec map is rendered as a table at the end.
fn render_html(input: &DetailPageInput, copy: &DetailCopy) -> String {
    let mut html = String::from("<div>\n");

    let sections = input
        .images
        .iter()
        .zip(copy.headlines.iter())
        .zip(copy.subcopies.iter());
    for ((image, headline), subcopy) in sections {
        html.push_str(&format!(
            "<h2>{}</h2>\n<p>{}</p>\n<img src=\"{}\" alt=\"{}\">\n",
            escape_html(headline),
            escape_html(subcopy),
            escape_html(&image.url),
            escape_html(&input.name),
        ));
    }

    if !copy.specs.is_empty() {
        html.push_str(&format!("<h2>{SPECS_HEADING}</h2>\n<table>\n"));
        for (key, value) in &copy.specs {
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                escape_html(key),
                escape_html(&value_text(value)),
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</div>");
    html
}

/// Spec values may be strings or bare scalars; render both without quotes.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip markup that must not reach the catalog: inline `style`
/// attributes, and full-document shells pasted around a fragment.
#[must_use]
pub fn sanitize_detail_content(html: &str) -> String {
    let html = STYLE_ATTR.replace_all(html, "");
    let html = DOC_HEAD.replace_all(&html, "");
    let html = DOC_TAIL.replace_all(&html, "");
    html.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Model that returns a canned response.
    struct ScriptedModel(String);

    #[async_trait]
    impl CopyModel for ScriptedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Ok(self.0.clone())
        }
    }

    fn input() -> DetailPageInput {
        DetailPageInput {
            name: "Stainless Kettle".to_string(),
            description: Some("1.5L kettle".to_string()),
            images: vec![
                MediaRef {
                    url: "/uploads/a.jpg".to_string(),
                },
                MediaRef {
                    url: "/uploads/b.jpg".to_string(),
                },
            ],
            price: Some(Decimal::new(19900, 0)),
            attributes: Map::new(),
            source_platform: "1688".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_renders_sections_and_specs() {
        let model = ScriptedModel(
            r#"{"headlines":["튼튼한 본체","빠른 가열"],
                "subcopies":["스테인리스 재질.","3분이면 끓습니다."],
                "specs":{"용량":"1.5L","재질":"스테인리스"}}"#
                .to_string(),
        );
        let html = Synthesizer::new(model)
            .generate(&input())
            .await
            .expect("generation failed");

        assert!(html.starts_with("<div>"));
        assert!(html.ends_with("</div>"));
        assert!(html.contains("<h2>튼튼한 본체</h2>"));
        assert!(html.contains("<p>3분이면 끓습니다.</p>"));
        assert!(html.contains(r#"<img src="/uploads/b.jpg""#));
        assert!(html.contains("<h2>제품 제원</h2>"));
        assert!(html.contains("<tr><th>용량</th><td>1.5L</td></tr>"));
    }

    #[tokio::test]
    async fn test_generate_drops_unpaired_sections() {
        // Two images but only one headline/subcopy pair.
        let model = ScriptedModel(
            r#"{"headlines":["하나"],"subcopies":["한 문장."],"specs":{}}"#.to_string(),
        );
        let html = Synthesizer::new(model)
            .generate(&input())
            .await
            .expect("generation failed");

        assert!(html.contains("/uploads/a.jpg"));
        assert!(!html.contains("/uploads/b.jpg"));
        assert!(!html.contains(SPECS_HEADING));
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_copy() {
        let model = ScriptedModel("here is your copy: great product!".to_string());
        let result = Synthesizer::new(model).generate(&input()).await;
        assert!(matches!(result, Err(GenerateError::Parse(_))));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A&B"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_sanitize_strips_inline_styles() {
        let html = r#"<div><p style="color: red">hi</p></div>"#;
        assert_eq!(sanitize_detail_content(html), "<div><p>hi</p></div>");
    }

    #[test]
    fn test_sanitize_collapses_document_shell() {
        let html = "<!DOCTYPE html>\n<html><head><title>x</title></head>\n<body class=\"page\">\n<div><p>hi</p></div>\n</body>\n</html>";
        assert_eq!(sanitize_detail_content(html), "<div><p>hi</p></div>");
    }

    #[test]
    fn test_sanitize_leaves_fragments_alone() {
        let html = "<div><p>hi</p></div>";
        assert_eq!(sanitize_detail_content(html), html);
    }
}
