/// Security headers middleware
///
/// The services only return JSON and stored files, so the content policy
/// forbids everything else. Headers a handler already set are left alone.
///
/// ```text
/// X-Content-Type-Options: nosniff
/// X-Frame-Options: DENY
/// Referrer-Policy: no-referrer
/// Content-Security-Policy: default-src 'none'; frame-ancestors 'none'
/// Strict-Transport-Security: max-age=31536000; includeSubDomains   (production)
/// ```

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    response::Response,
};
use tower::{Layer, Service};

type HeaderList = Arc<[(HeaderName, HeaderValue)]>;

/// Layer adding the fixed security headers to every response
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: HeaderList,
}

impl SecurityHeadersLayer {
    /// `enable_hsts` should only be set behind HTTPS
    pub fn new(enable_hsts: bool) -> Self {
        let mut headers = vec![
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ),
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
            ),
        ];

        if enable_hsts {
            headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ));
        }

        Self {
            headers: headers.into(),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            headers: self.headers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    headers: HeaderList,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let pending = self.inner.call(request);
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = pending.await?;
            let target = response.headers_mut();

            for (name, value) in headers.iter() {
                if !target.contains_key(name) {
                    target.insert(name.clone(), value.clone());
                }
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::HeaderMap, routing::get, Router};
    use tower::ServiceExt;

    async fn headers_for(app: Router) -> HeaderMap {
        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        response.headers().clone()
    }

    fn app(enable_hsts: bool) -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(SecurityHeadersLayer::new(enable_hsts))
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let headers = headers_for(app(false)).await;

        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_hsts_enabled_in_production() {
        let headers = headers_for(app(true)).await;
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_handler_headers_win() {
        let app = Router::new()
            .route(
                "/test",
                get(|| async { ([(header::X_FRAME_OPTIONS, "SAMEORIGIN")], "ok") }),
            )
            .layer(SecurityHeadersLayer::new(false));

        let headers = headers_for(app).await;
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
