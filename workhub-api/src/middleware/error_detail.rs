/// Diagnostic error details
///
/// Only installed when `expose_error_details` is on. Copies the
/// [`ErrorDetail`] extension of a 500 response into the JSON body as
/// `error`, so a developer can see the underlying failure.

use axum::{
    body::{to_bytes, Body},
    http::header,
    response::Response,
};

use crate::error::ErrorDetail;

/// Largest error body the middleware will rewrite
const MAX_ERROR_BODY: usize = 64 * 1024;

/// `map_response` function adding `error` to responses that carry a detail
pub async fn attach_error_detail(response: Response) -> Response {
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut json = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return Response::from_parts(parts, Body::from(bytes)),
    };
    json.insert("error".to_string(), serde_json::Value::String(detail));

    match serde_json::to_vec(&json) {
        Ok(rewritten) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rewritten))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use axum::{http::Request, response::IntoResponse, routing::get, Router};
    use tower::ServiceExt;

    async fn failing() -> Result<&'static str, ApiError> {
        Err(ApiError::internal("relation \"tasks\" does not exist"))
    }

    async fn missing() -> Result<&'static str, ApiError> {
        Err(ApiError::NotFound("Task not found".to_string()))
    }

    async fn call(app: Router, uri: &str) -> serde_json::Value {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app(expose: bool) -> Router {
        let router = Router::new()
            .route("/fail", get(failing))
            .route("/missing", get(missing));

        if expose {
            router.layer(axum::middleware::map_response(attach_error_detail))
        } else {
            router
        }
    }

    #[tokio::test]
    async fn test_detail_added_when_enabled() {
        let body = call(app(true), "/fail").await;
        assert_eq!(body["message"], "Server error");
        assert_eq!(body["error"], "relation \"tasks\" does not exist");
    }

    #[tokio::test]
    async fn test_detail_absent_when_disabled() {
        let body = call(app(false), "/fail").await;
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_other_errors_untouched() {
        let body = call(app(true), "/missing").await;
        assert_eq!(body, serde_json::json!({ "success": false, "message": "Task not found" }));
    }

    #[test]
    fn test_into_response_carries_detail() {
        let response = ApiError::internal("boom").into_response();
        assert!(response.extensions().get::<ErrorDetail>().is_some());
    }
}
