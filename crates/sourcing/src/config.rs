//! Pipeline configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `MEDIA_ROOT` - Directory for downloaded media (default: `public/uploads`)
//! - `TRANSLATE_TARGET_LANG` - Storefront display language (default: `ko`)
//! - `GOOGLE_TRANSLATE_API_KEY` - Google Translate v2 API key; when unset,
//!   translation degrades to pass-through of the source text
//! - `GEMINI_API_KEY` - Gemini API key; when unset, detail-page generation
//!   is unavailable (it has no meaningful fallback)
//! - `GEMINI_MODEL` - Gemini model ID (default: `gemini-1.5-pro`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MEDIA_ROOT: &str = "public/uploads";
const DEFAULT_TARGET_LANGUAGE: &str = "ko";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "insert", "enter-", "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Sourcing pipeline configuration.
#[derive(Debug, Clone)]
pub struct SourcingConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: SecretString,
    /// Root directory for locally persisted media
    pub media_root: PathBuf,
    /// Language code the storefront displays (translation target)
    pub target_language: String,
    /// Google Translate configuration (optional - translation degrades to
    /// pass-through when absent)
    pub translate: Option<TranslateConfig>,
    /// Gemini configuration (optional - generation fails when absent)
    pub gemini: Option<GeminiConfig>,
}

/// Google Translate v2 API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct TranslateConfig {
    /// Google Cloud API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for TranslateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslateConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// Gemini API key
    pub api_key: SecretString,
    /// Model ID (e.g., gemini-1.5-pro)
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl SourcingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or if
    /// present secrets look like placeholders.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_required_secret("DATABASE_URL")?,
            media_root: PathBuf::from(get_env_or_default("MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
            target_language: get_env_or_default("TRANSLATE_TARGET_LANG", DEFAULT_TARGET_LANGUAGE),
            translate: TranslateConfig::from_env()?,
            gemini: GeminiConfig::from_env()?,
        })
    }

    /// Returns the Gemini configuration (if configured).
    #[must_use]
    pub const fn gemini(&self) -> Option<&GeminiConfig> {
        self.gemini.as_ref()
    }

    /// Returns the translate configuration (if configured).
    #[must_use]
    pub const fn translate(&self) -> Option<&TranslateConfig> {
        self.translate.as_ref()
    }
}

impl TranslateConfig {
    /// Load Google Translate configuration from environment.
    ///
    /// Returns `None` if `GOOGLE_TRANSLATE_API_KEY` is not set
    /// (translation falls back to the source text).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("GOOGLE_TRANSLATE_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "GOOGLE_TRANSLATE_API_KEY")?;
        Ok(Some(Self {
            api_key: SecretString::from(api_key),
        }))
    }
}

impl GeminiConfig {
    /// Load Gemini configuration from environment.
    ///
    /// Returns `None` if `GEMINI_API_KEY` is not set (detail-page
    /// generation disabled).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("GEMINI_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "GEMINI_API_KEY")?;
        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("AIzaSyB3k9xQ2mL5nR8pT1vW4yZ7", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_gemini_config_debug_redacts_secrets() {
        let config = GeminiConfig {
            api_key: SecretString::from("AIzaSyB3k9xQ2mL5nR8pT1vW4yZ7"),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gemini-1.5-pro"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSyB3k9xQ2mL5nR8pT1vW4yZ7"));
    }

    #[test]
    fn test_translate_config_debug_redacts_secrets() {
        let config = TranslateConfig {
            api_key: SecretString::from("AIzaSyC8j2wQ9mN4kP6rS3vT5xZ1"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSyC8j2wQ9mN4kP6rS3vT5xZ1"));
    }

    #[test]
    fn test_default_gemini_model() {
        assert_eq!(DEFAULT_GEMINI_MODEL, "gemini-1.5-pro");
    }
}
