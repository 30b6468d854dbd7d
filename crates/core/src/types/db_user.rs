//! Database (authentication) user definition.

use secrecy::SecretString;

use super::role::RoleGrant;

/// A `MongoDB` user to provision with `createUser`.
///
/// The password is kept as a [`SecretString`] so it never shows up in logs
/// or `Debug` output.
#[derive(Debug, Clone)]
pub struct DatabaseUser {
    pub username: String,
    pub password: SecretString,
    pub roles: Vec<RoleGrant>,
}

impl DatabaseUser {
    /// A user owning exactly one database.
    #[must_use]
    pub fn owner(username: impl Into<String>, password: SecretString, db: &str) -> Self {
        Self {
            username: username.into(),
            password,
            roles: vec![RoleGrant::owner_of(db)],
        }
    }
}

// BSON support (with mongodb feature)
#[cfg(feature = "mongodb")]
impl DatabaseUser {
    /// Build the `createUser` command document.
    #[must_use]
    pub fn create_user_command(&self) -> bson::Document {
        use secrecy::ExposeSecret;

        let roles: Vec<bson::Document> = self
            .roles
            .iter()
            .map(|grant| bson::doc! { "role": grant.role.as_str(), "db": &grant.db })
            .collect();
        bson::doc! {
            "createUser": &self.username,
            "pwd": self.password.expose_secret(),
            "roles": roles,
        }
    }
}
