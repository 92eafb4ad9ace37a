/// Authentication endpoints (auth service)
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a user, returns the user and a token
/// - `POST /auth/login` - Exchange credentials for a token
/// - `GET /auth/me` - Current user (bearer token)
/// - `PUT /auth/password` - Change own password (bearer token)
/// - `GET /auth/users` - List users
/// - `GET /auth/users/:id` - Get a user
///
/// Users are always returned without their password hash.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workhub_shared::{
    auth::{jwt, password},
    models::user::{NewUser, PublicUser, User},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{required, validated, Param, Payload},
    middleware::auth::{require_auth, AuthUser},
    response::{Collection, Envelope, Record},
};

const REGISTER_REQUIRED: &str = "name, email, and password are required";
const LOGIN_REQUIRED: &str = "email and password are required";
const PASSWORD_REQUIRED: &str = "current_password and new_password are required";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "name, email, and password are required"),
        length(min = 1, message = "name, email, and password are required")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "name, email, and password are required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "name, email, and password are required"),
        length(min = 1, message = "name, email, and password are required")
    )]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "email and password are required"),
        length(min = 1, message = "email and password are required")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "email and password are required"),
        length(min = 1, message = "email and password are required")
    )]
    pub password: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(
        required(message = "current_password and new_password are required"),
        length(min = 1, message = "current_password and new_password are required")
    )]
    pub current_password: Option<String>,

    #[validate(
        required(message = "current_password and new_password are required"),
        length(min = 1, message = "current_password and new_password are required")
    )]
    pub new_password: Option<String>,
}

/// Register and login response payload
#[derive(Debug, Serialize)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/users", get(list_users))
        .route("/auth/users/:id", get(get_user))
        .merge(protected)
}

fn issue_token(state: &AppState, user: &PublicUser) -> ApiResult<String> {
    let config = state.jwt()?;
    let claims = jwt::Claims::new(user.id, user.email.as_str(), config.ttl());
    Ok(jwt::create_token(&claims, &config.secret)?)
}

/// Registers a new user
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields or malformed email
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<RegisterRequest>,
) -> ApiResult<Envelope<Session>> {
    let req = validated(req)?;
    let name = required(req.name, REGISTER_REQUIRED)?;
    let email = required(req.email, REGISTER_REQUIRED)?;
    let password = required(req.password, REGISTER_REQUIRED)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = password::hash_in_background(password).await?;

    let user = User::create(
        &state.db,
        NewUser {
            name,
            email,
            password_hash,
        },
    )
    .await?;

    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Envelope::data(Session { user, token })
        .created()
        .with_message("User registered successfully"))
}

/// Logs a user in
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> ApiResult<Envelope<Session>> {
    let req = validated(req)?;
    let email = required(req.email, LOGIN_REQUIRED)?;
    let password = required(req.password, LOGIN_REQUIRED)?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_in_background(password, user.password.clone()).await? {
        tracing::debug!(user_id = user.id, "Rejected login");
        return Err(invalid());
    }

    let user = PublicUser::from(user);
    let token = issue_token(&state, &user)?;

    Ok(Envelope::data(Session { user, token }).with_message("Login successful"))
}

/// Returns the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Record<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Envelope::record("user", user))
}

/// Changes the authenticated user's password
///
/// # Errors
///
/// - `401 Unauthorized`: `current_password` doesn't match
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Payload(req): Payload<ChangePasswordRequest>,
) -> ApiResult<Envelope> {
    let req = validated(req)?;
    let current_password = required(req.current_password, PASSWORD_REQUIRED)?;
    let new_password = required(req.new_password, PASSWORD_REQUIRED)?;

    let user = User::find_with_password(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_in_background(current_password, user.password).await? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_in_background(new_password).await?;

    User::update_password(&state.db, auth.user_id, &password_hash)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = auth.user_id, "Password changed");

    Ok(Envelope::message("Password updated successfully"))
}

/// Lists all users, newest first
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Collection<PublicUser>> {
    let users = User::list(&state.db).await?;
    Ok(Envelope::collection("users", users))
}

/// Gets a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Param(id): Param<i32>,
) -> ApiResult<Record<PublicUser>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Envelope::record("user", user))
}
