//! Clementine Sourcing - supplier-listing import and publish pipeline.
//!
//! This crate turns raw scraper output into admin-reviewable staging
//! listings and, on demand, into customer-facing catalog products:
//!
//! 1. [`extract`] pulls title/price/images/attributes out of an arbitrary
//!    scraper JSON document, defensively.
//! 2. [`services::translate`] best-effort machine-translates name and
//!    description, falling back to the source text on any failure.
//! 3. [`services::assets`] downloads the listing's media concurrently,
//!    tolerating per-file failures.
//! 4. [`db`] upserts the staging listing keyed by its source URL.
//! 5. [`services::detail_page`] asks a generative model for per-image
//!    marketing copy and renders the detail HTML fragment.
//! 6. [`publish`] promotes a finished listing into the canonical catalog
//!    atomically.
//!
//! The surrounding application (HTTP layer, admin UI, auth) is out of
//! scope; [`pipeline::Importer`] and [`publish::Publisher`] are the
//! interfaces it consumes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod services;

pub use config::SourcingConfig;
pub use error::SourcingError;
pub use pipeline::Importer;
pub use publish::Publisher;
