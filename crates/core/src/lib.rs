//! Mongo Initdb Core - Seed data and domain types.
//!
//! This crate provides the types shared by the bootstrap tooling:
//! - `cli` - The `initdb` binary that provisions a fresh database
//! - `integration-tests` - Checks against a live `MongoDB` instance
//!
//! # Architecture
//!
//! The core crate contains only types and literal data - no I/O, no database
//! connections. BSON conversions are available behind the `mongodb` feature.
//!
//! # Modules
//!
//! - [`types`] - Role tags, user documents and database user definitions
//! - [`seed`] - The literal records inserted into a fresh `users` collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod seed;
pub mod types;

pub use seed::{SeedDataError, USERS_COLLECTION, seed_users};
pub use types::*;
