//! # WorkHub Shared Library
//!
//! This crate contains the storage-facing half of the WorkHub services: the
//! connection provider, schema bootstrap, entity repositories, credential
//! primitives and the blob storage adapter.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and schema bootstrap
//! - `error`: Typed storage failures
//! - `models`: Entity rows and their repository operations
//! - `auth`: Password hashing and token signing
//! - `storage`: Object store adapter with local-disk fallback

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod storage;

/// Current version of the WorkHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
