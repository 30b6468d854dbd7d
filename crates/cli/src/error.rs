//! Unified error handling for the bootstrap tool.

use mongo_initdb_core::SeedDataError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Any error that ends a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Neither configuration accessor produced a usable value set.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A database step failed.
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// The literal seed records could not be built.
    #[error("Seed data error: {0}")]
    SeedData(#[from] SeedDataError),
}
