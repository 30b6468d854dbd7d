//! Core types for the bootstrap tooling.

pub mod db_user;
pub mod role;
pub mod user;

pub use db_user::DatabaseUser;
pub use role::{DatabaseRole, RoleGrant, UserRole};
pub use user::UserDocument;
