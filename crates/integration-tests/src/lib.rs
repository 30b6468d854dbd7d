//! Integration tests for the bootstrap tool.
//!
//! # Running Tests
//!
//! ```bash
//! # Start a throwaway server
//! docker run --rm -d -p 27017:27017 mongo:7
//!
//! # Run the ignored live-database tests
//! cargo test -p mongo-initdb-integration-tests -- --ignored
//! ```
//!
//! `MONGO_TEST_URI` points the tests at another server (default
//! `mongodb://localhost:27017`). Every test works in its own database and
//! drops it afterwards.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use mongo_initdb_cli::BootstrapConfig;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Database};
use secrecy::SecretString;

const DEFAULT_TEST_URI: &str = "mongodb://localhost:27017";

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Connection string for the test server.
#[must_use]
pub fn test_uri() -> String {
    std::env::var("MONGO_TEST_URI").unwrap_or_else(|_| DEFAULT_TEST_URI.to_owned())
}

/// A database name no other test uses.
#[must_use]
pub fn unique_database_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{nanos}_{n}")
}

/// Bootstrap configuration for `database` on the test server.
#[must_use]
pub fn test_config(database: &str) -> BootstrapConfig {
    BootstrapConfig {
        mongo_uri: SecretString::from(test_uri()),
        database: database.to_owned(),
        admin_username: format!("{database}_owner"),
        admin_password: SecretString::from("integration-secret"),
    }
}

/// Look up a user with `usersInfo`.
///
/// # Errors
///
/// Returns the driver error if the command fails.
pub async fn user_info(db: &Database, username: &str) -> mongodb::error::Result<Option<Document>> {
    let reply = db.run_command(doc! { "usersInfo": username }).await?;
    let user = reply
        .get_array("users")
        .ok()
        .and_then(|users| users.first())
        .and_then(|user| user.as_document())
        .cloned();
    Ok(user)
}

/// Drop the owner created for `database` and the database itself.
///
/// Failures are logged rather than returned so a failing cleanup never masks
/// the test result.
pub async fn cleanup(client: &Client, database: &str, username: &str) {
    let db = client.database(database);
    if let Err(e) = db.run_command(doc! { "dropUser": username }).await {
        tracing::warn!(database, user = username, error = %e, "Failed to drop test user");
    }
    if let Err(e) = db.drop().await {
        tracing::warn!(database, error = %e, "Failed to drop test database");
    }
}
