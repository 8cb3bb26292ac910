//! Clementine Core - Shared types library.
//!
//! This crate provides common types used across all Clementine components:
//! - `sourcing` - The supplier-listing import and detail-page pipeline
//! - `cli` - Command-line tools for migrations and pipeline operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, listing statuses, and media references

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
