//! Top-level error type for sourcing operations.

use crate::db::RepositoryError;
use crate::services::GenerateError;

/// Errors returned by the import, generation, and publish operations.
#[derive(Debug, thiserror::Error)]
pub enum SourcingError {
    /// Storage-layer failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Copy-generation failure
    #[error("Generation error: {0}")]
    Generation(#[from] GenerateError),

    /// Caller supplied a request that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The referenced listing or category does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The listing is missing data a later stage requires
    #[error("Listing not ready: {0}")]
    Incomplete(String),
}

impl SourcingError {
    /// Whether retrying the same request could succeed without changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(RepositoryError::Database(_)) => true,
            Self::Generation(e) => matches!(
                e,
                GenerateError::Http(_) | GenerateError::RateLimited(_)
            ),
            _ => false,
        }
    }
}
