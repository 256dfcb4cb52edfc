//! Kiosk Core - Shared types library.
//!
//! This crate provides the domain types used across all Kiosk components:
//! - `storefront` - Order/checkout HTTP service
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds sqlx encoding
//! so the types can be bound and decoded directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
