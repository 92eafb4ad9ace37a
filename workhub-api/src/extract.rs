/// Request extractors whose rejections use the standard error envelope
///
/// axum's own `Json`, `Path` and `Query` reject with plain-text bodies;
/// these wrappers route the rejection through [`ApiError`] instead.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Param<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Runs the `validator` rules of a request DTO
pub fn validated<T: Validate>(request: T) -> ApiResult<T> {
    request.validate()?;
    Ok(request)
}

/// Takes a field that validation has already checked for presence
///
/// `message` is the 400 message used if the field is absent after all.
pub fn required<T>(value: Option<T>, message: &'static str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::BadRequest(message.to_string()))
}
