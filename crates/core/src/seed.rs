//! Literal seed records for a fresh `users` collection.
//!
//! The values are fixed: passwords are pre-computed bcrypt hashes and the
//! timestamps are baked in, so every fresh database starts byte-identical.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{UserDocument, UserRole};

/// Name of the collection holding application users.
pub const USERS_COLLECTION: &str = "users";

const ADMIN_PASSWORD_HASH: &str = "$2b$12$N/LPnzvpHyE2KI2cuxhMz.3FSnF7MuoN6EeDKtE9yGiqMBVj3US/e";
const ADMIN_TIMESTAMP: &str = "2022-08-05T17:35:00.060Z";

const USER_PASSWORD_HASH: &str = "$2b$12$bCT0LidMlwjjA1YCKtZkxeuc74CU1R1zxqE9ntSE7s7IYkP2fbtrK";
const USER_TIMESTAMP: &str = "2022-07-15T21:37:00.000Z";

/// Errors building the seed records.
#[derive(Debug, Error)]
pub enum SeedDataError {
    /// A literal timestamp failed to parse.
    #[error("invalid seed timestamp {value}: {source}")]
    Timestamp {
        value: &'static str,
        source: chrono::ParseError,
    },
}

fn timestamp(value: &'static str) -> Result<DateTime<Utc>, SeedDataError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| SeedDataError::Timestamp { value, source })
}

/// The two seed users: `admin` (role `admin`) then `user` (role `user`).
///
/// # Errors
///
/// Returns an error only if a literal timestamp is malformed.
pub fn seed_users() -> Result<Vec<UserDocument>, SeedDataError> {
    let admin_at = timestamp(ADMIN_TIMESTAMP)?;
    let user_at = timestamp(USER_TIMESTAMP)?;

    Ok(vec![
        UserDocument {
            email: "admin@email.com".to_owned(),
            username: "admin".to_owned(),
            password: ADMIN_PASSWORD_HASH.to_owned(),
            roles: vec![UserRole::Admin],
            creation: admin_at,
            last_update: admin_at,
        },
        UserDocument {
            email: "user@email.com".to_owned(),
            username: "user".to_owned(),
            password: USER_PASSWORD_HASH.to_owned(),
            roles: vec![UserRole::User],
            creation: user_at,
            last_update: user_at,
        },
    ])
}
