//! The bootstrap procedure.
//!
//! Runs once against a fresh database, in this order:
//!
//! 1. select the target database (done by the caller when building the target)
//! 2. create the database owner
//! 3. create the `users` collection and its unique indexes
//! 4. insert the two seed users
//!
//! Every step's error is returned as-is. Nothing is rolled back: a failure
//! after step 2 leaves the owner in place.

use mongo_initdb_core::{USERS_COLLECTION, seed_users};
use tracing::info;

use crate::config::BootstrapConfig;
use crate::error::BootstrapError;
use crate::store::SeedTarget;

/// Fields that must be unique across the `users` collection.
pub const UNIQUE_USER_FIELDS: [&str; 2] = ["email", "username"];

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub database: String,
    pub admin_user: String,
    pub collection: &'static str,
    pub inserted: usize,
}

/// Provision and seed the database behind `target`.
///
/// # Errors
///
/// Returns the first error from any step.
pub async fn seed<T: SeedTarget>(
    target: &T,
    config: &BootstrapConfig,
) -> Result<SeedReport, BootstrapError> {
    // Build the literal records before touching the database.
    let users = seed_users()?;
    let admin = config.admin_user();

    info!(
        database = target.database_name(),
        user = %admin.username,
        "Creating database owner"
    );
    target.create_user(&admin).await?;

    info!(collection = USERS_COLLECTION, "Creating collection");
    target.create_collection(USERS_COLLECTION).await?;
    for field in UNIQUE_USER_FIELDS {
        target.create_unique_index(USERS_COLLECTION, field).await?;
    }

    info!(collection = USERS_COLLECTION, count = users.len(), "Inserting seed users");
    let inserted = target.insert_users(USERS_COLLECTION, &users).await?;

    Ok(SeedReport {
        database: target.database_name().to_owned(),
        admin_user: admin.username,
        collection: USERS_COLLECTION,
        inserted,
    })
}
