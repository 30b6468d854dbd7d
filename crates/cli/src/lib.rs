//! Mongo Initdb - provision and seed a fresh `MongoDB` database.
//!
//! The library half of the `initdb` binary, split out so the procedure can be
//! driven from integration tests.
//!
//! # Modules
//!
//! - [`config`] - Configuration accessors and resolution
//! - [`store`] - Database operations behind the [`store::SeedTarget`] trait
//! - [`bootstrap`] - The seeding procedure
//! - [`error`] - Unified error type

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod store;

pub use bootstrap::{SeedReport, seed};
pub use config::{BootstrapConfig, ConfigSource, EnvFile, ProcessEnv, ResolvedConfig};
pub use error::BootstrapError;
pub use store::{MongoTarget, SeedTarget, StoreError};
