//! Application user document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// A document in the `users` collection.
///
/// `password` holds a bcrypt hash and is treated as opaque here; nothing in
/// this crate hashes or verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    pub email: String,
    pub username: String,
    pub password: String,
    pub roles: Vec<UserRole>,
    pub creation: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

// BSON support (with mongodb feature)
#[cfg(feature = "mongodb")]
impl UserDocument {
    /// Build the BSON document inserted into the collection.
    ///
    /// Timestamps are stored as BSON dates with millisecond precision, the
    /// same representation the server uses for `new Date(...)`.
    #[must_use]
    pub fn to_document(&self) -> bson::Document {
        let roles: Vec<&str> = self.roles.iter().map(|role| role.as_str()).collect();
        bson::doc! {
            "email": &self.email,
            "username": &self.username,
            "password": &self.password,
            "roles": roles,
            "creation": bson::DateTime::from_millis(self.creation.timestamp_millis()),
            "last_update": bson::DateTime::from_millis(self.last_update.timestamp_millis()),
        }
    }
}
