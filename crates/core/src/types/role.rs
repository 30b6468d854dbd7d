//! Role tags.
//!
//! Two unrelated vocabularies live here: [`UserRole`] is the application
//! level tag stored in a user document, [`DatabaseRole`] is a `MongoDB`
//! built-in role granted to a database user.

use serde::{Deserialize, Serialize};

/// Application role stored in the `roles` array of a user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including user management.
    Admin,
    /// Regular account.
    User,
}

impl UserRole {
    /// Returns the tag as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in `MongoDB` database role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseRole {
    /// Owner of a single database: readWrite + dbAdmin + userAdmin.
    #[serde(rename = "dbOwner")]
    DbOwner,
}

impl DatabaseRole {
    /// Returns the role name understood by the server.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DbOwner => "dbOwner",
        }
    }
}

impl std::fmt::Display for DatabaseRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database role scoped to one database, e.g. `{ role: "dbOwner", db: "appdb" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: DatabaseRole,
    pub db: String,
}

impl RoleGrant {
    /// Owner role on `db`.
    #[must_use]
    pub fn owner_of(db: impl Into<String>) -> Self {
        Self {
            role: DatabaseRole::DbOwner,
            db: db.into(),
        }
    }
}
