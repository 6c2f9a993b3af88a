//! # ClubTask Shared Library
//!
//! Shared types, data access, and auth primitives used by the ClubTask
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, member requests)
//! - `auth`: Password hashing, JWT sessions, middleware, permissions
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the ClubTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
