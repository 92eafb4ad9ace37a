/// User profile endpoints (user service)
///
/// Profiles are addressed by the owning `user_id`, not their own id.
///
/// # Endpoints
///
/// - `POST /users/profile` - Create a profile
/// - `GET /users/profile/:user_id` - Get a profile
/// - `PUT /users/profile/:user_id` - Update a profile (sparse)
/// - `DELETE /users/profile/:user_id` - Delete a profile
/// - `GET /users/profiles` - List profiles
/// - `GET /users/profiles/role/:role` - List profiles with a role

use axum::{extract::State, routing::get, routing::post, Router};
use serde::Deserialize;
use validator::Validate;
use workhub_shared::models::user_profile::{NewProfile, ProfileChanges, UserProfile};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{required, validated, Param, Payload},
    response::{Collection, Envelope, Record},
};

const USER_ID_REQUIRED: &str = "user_id is required";

/// Create profile request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i32>,

    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/profile", post(create_profile))
        .route(
            "/users/profile/:user_id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/users/profiles", get(list_profiles))
        .route("/users/profiles/role/:role", get(list_profiles_by_role))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Profile not found".to_string())
}

/// Creates a profile
///
/// # Errors
///
/// - `400 Bad Request`: `user_id` missing
/// - `409 Conflict`: The user already has a profile
pub async fn create_profile(
    State(state): State<AppState>,
    Payload(req): Payload<CreateProfileRequest>,
) -> ApiResult<Record<UserProfile>> {
    let req = validated(req)?;
    let user_id = required(req.user_id, USER_ID_REQUIRED)?;

    if UserProfile::find_by_user_id(&state.db, user_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "Profile already exists for this user".to_string(),
        ));
    }

    let profile = UserProfile::create(
        &state.db,
        NewProfile {
            user_id,
            bio: req.bio,
            avatar_url: req.avatar_url,
            phone: req.phone,
            location: req.location,
            role: req.role,
            department: req.department,
            skills: req.skills,
        },
    )
    .await?;

    tracing::info!(user_id, profile_id = profile.id, "Profile created");

    Ok(Envelope::record("profile", profile)
        .created()
        .with_message("Profile created successfully"))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Param(user_id): Param<i32>,
) -> ApiResult<Record<UserProfile>> {
    let profile = UserProfile::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::record("profile", profile))
}

/// Applies the fields present in the body; absent fields keep their values
pub async fn update_profile(
    State(state): State<AppState>,
    Param(user_id): Param<i32>,
    Payload(changes): Payload<ProfileChanges>,
) -> ApiResult<Record<UserProfile>> {
    let profile = UserProfile::update(&state.db, user_id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::record("profile", profile).with_message("Profile updated successfully"))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Param(user_id): Param<i32>,
) -> ApiResult<Envelope> {
    UserProfile::delete(&state.db, user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::message("Profile deleted successfully"))
}

pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Collection<UserProfile>> {
    let profiles = UserProfile::list(&state.db).await?;
    Ok(Envelope::collection("profiles", profiles))
}

pub async fn list_profiles_by_role(
    State(state): State<AppState>,
    Param(role): Param<String>,
) -> ApiResult<Collection<UserProfile>> {
    let profiles = UserProfile::list_by_role(&state.db, &role).await?;
    Ok(Envelope::collection("profiles", profiles))
}
