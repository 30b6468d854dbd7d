//! `MongoDB` access for the bootstrap procedure.
//!
//! [`SeedTarget`] is the narrow set of operations the procedure needs. The
//! production implementation, [`MongoTarget`], wraps one
//! [`mongodb::Database`] handle that is passed in explicitly.

use mongo_initdb_core::{DatabaseUser, UserDocument};
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Application name reported to the server.
const APP_NAME: &str = "mongo-initdb";

/// Server error codes treated as "already exists".
const NAMESPACE_EXISTS: i32 = 48;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver or server error.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// The object being created already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Map a driver error, turning "already exists" codes into [`StoreError::Conflict`].
    fn classify(err: mongodb::error::Error, what: impl FnOnce() -> String) -> Self {
        match server_code(&err) {
            Some(
                NAMESPACE_EXISTS
                | INDEX_OPTIONS_CONFLICT
                | INDEX_KEY_SPECS_CONFLICT
                | DUPLICATE_KEY
                | USER_ALREADY_EXISTS,
            ) => Self::Conflict(what()),
            _ => Self::Database(err),
        }
    }
}

/// Extract the server error code, if the error carries one.
fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|write_error| write_error.code),
        _ => None,
    }
}

/// Operations the bootstrap procedure performs against one database.
#[allow(async_fn_in_trait)]
pub trait SeedTarget {
    /// Name of the selected database.
    fn database_name(&self) -> &str;

    /// Provision a database user (`createUser`).
    async fn create_user(&self, user: &DatabaseUser) -> Result<(), StoreError>;

    /// Create an empty collection.
    async fn create_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Create an ascending unique index on a single field.
    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Insert documents in order, returning how many were inserted.
    async fn insert_users(
        &self,
        collection: &str,
        users: &[UserDocument],
    ) -> Result<usize, StoreError>;
}

/// Connect to the server and verify the connection with a `ping`.
///
/// # Errors
///
/// Returns an error if the URI is invalid or the server is unreachable.
pub async fn connect(uri: &SecretString) -> Result<Client, StoreError> {
    let mut options = ClientOptions::parse(uri.expose_secret()).await?;
    options.app_name = Some(APP_NAME.to_owned());
    let client = Client::with_options(options)?;

    ping(&client).await?;
    tracing::info!("Connected to MongoDB");

    Ok(client)
}

/// Run `{ ping: 1 }` against the `admin` database.
///
/// # Errors
///
/// Returns an error if the server does not answer.
pub async fn ping(client: &Client) -> Result<(), StoreError> {
    client.database("admin").run_command(doc! { "ping": 1 }).await?;
    Ok(())
}

/// A [`SeedTarget`] backed by a live database.
#[derive(Debug, Clone)]
pub struct MongoTarget {
    db: Database,
}

impl MongoTarget {
    /// Select (lazily creating) `name` on `client`.
    ///
    /// `MongoDB` creates the database on first write, so selecting never fails.
    #[must_use]
    pub fn select(client: &Client, name: &str) -> Self {
        Self {
            db: client.database(name),
        }
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}

impl SeedTarget for MongoTarget {
    fn database_name(&self) -> &str {
        self.db.name()
    }

    async fn create_user(&self, user: &DatabaseUser) -> Result<(), StoreError> {
        self.db
            .run_command(user.create_user_command())
            .await
            .map_err(|e| {
                StoreError::classify(e, || format!("user {} already exists", user.username))
            })?;
        Ok(())
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.db
            .create_collection(name)
            .await
            .map_err(|e| StoreError::classify(e, || format!("collection {name} already exists")))
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.db
            .collection::<Document>(collection)
            .create_index(index)
            .await
            .map_err(|e| {
                StoreError::classify(e, || {
                    format!("conflicting index on {collection}.{field} already exists")
                })
            })?;
        Ok(())
    }

    async fn insert_users(
        &self,
        collection: &str,
        users: &[UserDocument],
    ) -> Result<usize, StoreError> {
        let documents: Vec<Document> = users.iter().map(UserDocument::to_document).collect();
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_many(documents)
            .await
            .map_err(|e| {
                StoreError::classify(e, || format!("seed users already present in {collection}"))
            })?;
        Ok(result.inserted_ids.len())
    }
}
