/// Middleware for the services
///
/// - `auth`: Bearer token authentication for protected auth-service routes
/// - `error_detail`: Diagnostic `error` field on 500 responses
/// - `security`: Security response headers

pub mod auth;
pub mod error_detail;
pub mod security;
