//! Best-effort machine translation.
//!
//! Translation is optional everywhere it is used: on any failure (missing
//! credentials, network error, malformed response) the caller gets the
//! source text back, tagged as untranslated, and the failure is logged.
//! Errors never propagate - callers must not special-case translation
//! failure.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::TranslateConfig;

const TRANSLATE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Outcome of a translation attempt.
///
/// Both variants carry display-ready text; the variant tells the caller
/// whether the service actually ran, so a UI could badge machine
/// translation failures instead of silently showing source-language text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The service returned translated text.
    Translated(String),
    /// The source text, unchanged (empty input, missing credentials, or a
    /// degraded failure).
    Untranslated(String),
}

impl Translation {
    /// The text to display, regardless of how it was produced.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(s) | Self::Untranslated(s) => s,
        }
    }

    /// Consume into the display text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Translated(s) | Self::Untranslated(s) => s,
        }
    }

    /// Whether the translation service actually produced this text.
    #[must_use]
    pub const fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }
}

/// Internal failure reasons; converted to fallback values, never surfaced.
#[derive(Debug, thiserror::Error)]
enum TranslateError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("response carried no translations")]
    EmptyResponse,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Google Translate v2 client with pass-through degradation.
pub struct Translator {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    target_language: String,
    endpoint: String,
}

impl Translator {
    /// Create a translator.
    ///
    /// With no `config` the translator is a pure pass-through: every call
    /// returns [`Translation::Untranslated`] without touching the network.
    #[must_use]
    pub fn new(config: Option<&TranslateConfig>, target_language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.map(|c| c.api_key.clone()),
            target_language: target_language.into(),
            endpoint: TRANSLATE_API_URL.to_string(),
        }
    }

    /// Override the service endpoint (tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Translate `text` to the configured target language.
    ///
    /// Empty input returns empty output without a network call. Any
    /// failure logs a warning and returns the input unchanged.
    #[instrument(skip(self, text), fields(target = %self.target_language, len = text.len()))]
    pub async fn translate(&self, text: &str) -> Translation {
        if text.is_empty() {
            return Translation::Untranslated(String::new());
        }

        let Some(api_key) = self.api_key.as_ref() else {
            tracing::debug!("translation credentials not configured, passing text through");
            return Translation::Untranslated(text.to_string());
        };

        match self.request(api_key, text).await {
            Ok(translated) => Translation::Translated(translated),
            Err(e) => {
                tracing::warn!(error = %e, "translation failed, falling back to source text");
                Translation::Untranslated(text.to_string())
            }
        }
    }

    async fn request(&self, api_key: &SecretString, text: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key.expose_secret())])
            .json(&serde_json::json!({
                "q": text,
                "target": self.target_language,
                "format": "text",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .filter(|t| !t.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn configured(endpoint: &str) -> Translator {
        let config = TranslateConfig {
            api_key: SecretString::from("AIzaSyTest1234567890abcdef"),
        };
        Translator::new(Some(&config), "ko").with_endpoint(endpoint)
    }

    #[tokio::test]
    async fn test_successful_translation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"data": {"translations": [{"translatedText": "스테인리스 주전자"}]}}),
            ))
            .mount(&server)
            .await;

        let translator = configured(&server.uri());
        let result = translator.translate("Stainless Kettle").await;
        assert_eq!(result, Translation::Translated("스테인리스 주전자".to_string()));
    }

    #[tokio::test]
    async fn test_service_error_falls_back_to_source_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let translator = configured(&server.uri());
        let result = translator.translate("Stainless Kettle").await;
        assert_eq!(result, Translation::Untranslated("Stainless Kettle".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let translator = configured(&server.uri());
        let result = translator.translate("Widget").await;
        assert_eq!(result, Translation::Untranslated("Widget".to_string()));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let translator = configured(&server.uri());
        let result = translator.translate("").await;
        assert_eq!(result, Translation::Untranslated(String::new()));
    }

    #[tokio::test]
    async fn test_missing_credentials_pass_through() {
        let translator = Translator::new(None, "ko");
        let result = translator.translate("Widget").await;
        assert_eq!(result, Translation::Untranslated("Widget".to_string()));
        assert!(!result.is_translated());
    }
}
