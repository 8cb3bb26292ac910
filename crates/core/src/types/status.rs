//! Lifecycle status for staged supplier listings.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a sourced-listing staging record.
///
/// The normal progression is `Sourced`/`Pending` → `Updated` → `Imported` →
/// `Published`, but staging rows are always admin-editable so any status can
/// be written at any time. [`ListingStatus::follows`] reports whether a
/// transition moves forward through the pipeline; stores use it to log
/// unusual (backward) writes, never to reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    /// Manually entered listing with no scraper payload behind it.
    Sourced,
    /// Freshly imported from a scrape, awaiting review.
    #[default]
    Pending,
    /// An existing listing was re-imported and its scraped fields refreshed.
    Updated,
    /// Promoted into a canonical product; staging row remains editable.
    Imported,
    /// Live on the storefront; no further edits expected through this flow.
    Published,
}

impl ListingStatus {
    /// Position within the normal pipeline progression.
    const fn rank(self) -> u8 {
        match self {
            Self::Sourced => 0,
            Self::Pending => 1,
            Self::Updated => 2,
            Self::Imported => 3,
            Self::Published => 4,
        }
    }

    /// Whether moving from `self` to `next` follows the normal pipeline
    /// direction. Backward moves are legal (staging rows are always
    /// mutable) but worth logging.
    #[must_use]
    pub const fn follows(self, next: Self) -> bool {
        next.rank() >= self.rank()
    }

    /// Whether the listing has reached its terminal state.
    #[must_use]
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sourced => "SOURCED",
            Self::Pending => "PENDING",
            Self::Updated => "UPDATED",
            Self::Imported => "IMPORTED",
            Self::Published => "PUBLISHED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SOURCED" => Ok(Self::Sourced),
            "PENDING" => Ok(Self::Pending),
            "UPDATED" => Ok(Self::Updated),
            "IMPORTED" => Ok(Self::Imported),
            "PUBLISHED" => Ok(Self::Published),
            _ => Err(format!("invalid listing status: {s}")),
        }
    }
}
