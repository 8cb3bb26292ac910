//! Core types for Clementine Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod media;
pub mod status;

pub use id::*;
pub use media::{MediaRef, media_to_value, normalize_media};
pub use status::ListingStatus;
