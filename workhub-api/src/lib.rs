//! # WorkHub service library
//!
//! Shared HTTP layer of the five WorkHub services. Each binary in `src/bin`
//! calls [`server::run`] with its [`config::ServiceKind`].
//!
//! ## Modules
//!
//! - `app`: Application state and router builders
//! - `config`: Environment-driven configuration
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with the error envelope
//! - `middleware`: Auth, security headers, diagnostic error detail
//! - `response`: Success envelope
//! - `routes`: Route handlers per service
//! - `server`: Process startup and shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
