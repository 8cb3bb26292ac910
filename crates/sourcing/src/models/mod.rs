//! Domain models for the sourcing pipeline.

pub mod listing;
pub mod product;

pub use listing::{ListingDraft, ListingPatch, MANUAL_SOURCE_PLATFORM, SourcedListing};
pub use product::{CanonicalDraft, CanonicalProduct, Category};
