/// Health check endpoint
///
/// Reports that the process is up. It deliberately does not touch the
/// database, so a service stays "UP" while PostgreSQL is unreachable.
///
/// ```text
/// GET /health
///
/// { "service": "Task Service", "status": "UP", "timestamp": "2024-03-01T12:00:00.000Z" }
/// ```

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Display name of the service
    pub service: String,

    /// Always "UP"
    pub status: String,

    /// RFC 3339, millisecond precision, UTC
    pub timestamp: String,
}

pub async fn health_check(State(config): State<Arc<Config>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: config.service.display_name().to_string(),
        status: "UP".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
