/// Error handling for the services
///
/// Handlers return `ApiResult<T>`; every failure becomes the standard
/// envelope `{ "success": false, "message": ... }` with a matching status.
///
/// Internal errors never put their cause in the body. Instead the cause is
/// attached to the response as an [`ErrorDetail`] extension, which
/// [`crate::middleware::error_detail`] copies into an `error` field when
/// diagnostic mode is on.
///
/// # Example
///
/// ```no_run
/// use workhub_api::error::{ApiError, ApiResult};
/// use workhub_api::response::{Envelope, Record};
/// use workhub_shared::models::project::Project;
/// use sqlx::PgPool;
///
/// async fn handler(pool: PgPool, id: i32) -> ApiResult<Record<Project>> {
///     let project = Project::find_by_id(&pool, id)
///         .await?
///         .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
///     Ok(Envelope::record("project", project))
/// }
/// ```

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use workhub_shared::{
    auth::{jwt::JwtError, password::PasswordError},
    error::StoreError,
    storage::StorageError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Public message of every 500 unless a handler chooses a more specific one
pub const SERVER_ERROR: &str = "Server error";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Missing or empty required fields (400)
    Validation {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email or profile
    Conflict(String),

    /// Internal server error (500)
    Internal {
        /// Shown to clients
        message: String,

        /// Logged, and exposed only in diagnostic mode
        detail: String,
    },
}

impl ApiError {
    /// 500 with the generic public message
    pub fn internal(detail: impl fmt::Display) -> Self {
        Self::internal_with(SERVER_ERROR, detail)
    }

    /// 500 with a specific public message
    pub fn internal_with(message: impl Into<String>, detail: impl fmt::Display) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

/// Cause of a 500, carried as a response extension
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation { message, .. } => write!(f, "Validation failed: {}", message),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal { message, detail } => write!(f, "{}: {}", message, detail),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None, None),
            ApiError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, message, Some(details), None)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None, None),
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message, None, Some(detail))
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(key) => ApiError::BadRequest(format!("Invalid file key: {}", key)),
            other => ApiError::internal(other),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::CreateError(_) => ApiError::internal(err),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is required", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = details
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| "Validation failed".to_string());

        ApiError::Validation { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = ApiError::NotFound("Project not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "success": false, "message": "Project not found" }));
    }

    #[tokio::test]
    async fn test_internal_hides_detail_in_body() {
        let response = ApiError::internal("connection refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorDetail>().map(|d| d.0.as_str()),
            Some("connection refused")
        );

        let body = body_json(response).await;
        assert_eq!(body["message"], SERVER_ERROR);
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err: ApiError = StoreError::ConstraintViolation("duplicate key".to_string()).into();
        assert!(matches!(err, ApiError::Internal { ref message, .. } if message == SERVER_ERROR));

        let err: ApiError = StoreError::Unavailable("pool timed out".to_string()).into();
        assert!(matches!(err, ApiError::Internal { .. }));
    }

    #[test]
    fn test_jwt_errors() {
        assert!(matches!(ApiError::from(JwtError::Expired), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from(JwtError::InvalidIssuer), ApiError::Unauthorized(_)));
        assert!(matches!(
            ApiError::from(JwtError::CreateError("boom".to_string())),
            ApiError::Internal { .. }
        ));
    }

    #[test]
    fn test_invalid_key_is_bad_request() {
        let err: ApiError = StorageError::InvalidKey("../x".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
