//! Command implementations and shared wiring.

pub mod generate;
pub mod import;
pub mod listing;
pub mod migrate;
pub mod publish;
pub mod recover;

use std::str::FromStr;

use clementine_core::{CategoryId, ListingId};
use clementine_sourcing::config::ConfigError;
use clementine_sourcing::db::{PgStore, RepositoryError, create_pool};
use clementine_sourcing::services::{AssetFetcher, GeminiClient, Synthesizer, Translator};
use clementine_sourcing::{Importer, Publisher, SourcingConfig, SourcingError};

/// Errors surfaced to the operator.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Sourcing(#[from] SourcingError),

    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Config plus a connected Postgres store.
pub struct Context {
    pub config: SourcingConfig,
    pub store: PgStore,
}

impl Context {
    /// Load the environment and connect to the database.
    pub async fn connect() -> Result<Self, CliError> {
        let config = SourcingConfig::from_env()?;
        let pool = create_pool(&config.database_url).await?;
        Ok(Self {
            config,
            store: PgStore::new(pool),
        })
    }

    /// Build an importer over this context's store.
    pub fn importer(&self) -> Importer<PgStore, GeminiClient> {
        let translator = Translator::new(self.config.translate(), &self.config.target_language);
        let fetcher = AssetFetcher::new(&self.config.media_root);
        let synthesizer = self
            .config
            .gemini()
            .map(|cfg| Synthesizer::new(GeminiClient::new(cfg)));
        Importer::new(self.store.clone(), translator, fetcher, synthesizer)
    }

    /// Build a publisher over this context's store.
    pub fn publisher(&self) -> Publisher<PgStore> {
        Publisher::new(self.store.clone())
    }
}

/// Parse a listing id argument.
pub fn parse_listing_id(arg: &str) -> Result<ListingId, CliError> {
    ListingId::from_str(arg)
        .map_err(|_| CliError::InvalidArg(format!("not a valid listing id: {arg}")))
}

/// Parse a category id argument.
pub fn parse_category_id(arg: &str) -> Result<CategoryId, CliError> {
    CategoryId::from_str(arg)
        .map_err(|_| CliError::InvalidArg(format!("not a valid category id: {arg}")))
}
