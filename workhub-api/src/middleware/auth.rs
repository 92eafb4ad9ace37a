/// Bearer token authentication
///
/// [`require_auth`] validates `Authorization: Bearer <jwt>` and stores the
/// caller as an [`AuthUser`] request extension; handlers behind it take
/// `Extension<AuthUser>`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use workhub_shared::auth::jwt;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
}

/// Rejects requests without a valid token with 401
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(jwt::extract_bearer)
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let claims = jwt::validate_token(token, &state.jwt()?.secret)?;

    tracing::debug!(user_id = claims.sub, email = %claims.email, "Authenticated request");

    req.extensions_mut().insert(AuthUser { user_id: claims.sub });

    Ok(next.run(req).await)
}
