/// Project endpoints (project service)
///
/// # Endpoints
///
/// - `POST /projects`, `GET /projects`
/// - `GET|PUT|DELETE /projects/:id` (delete cascades to members)
/// - `POST /projects/:id/members`, `GET /projects/:id/members`
/// - `DELETE /projects/:id/members/:user_id`
/// - `GET /projects/owner/:owner_id` - Projects owned by a user
/// - `GET /projects/member/:user_id` - Projects a user belongs to, with `member_role`

use axum::{
    extract::State,
    routing::{delete, get},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;
use workhub_shared::models::{
    project::{MemberProject, NewProject, Project, ProjectChanges},
    project_member::{NewMember, ProjectMember},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{required, validated, Param, Payload},
    response::{Collection, Envelope, Record},
};

const PROJECT_REQUIRED: &str = "name and owner_id are required";
const MEMBER_REQUIRED: &str = "user_id is required";

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        required(message = "name and owner_id are required"),
        length(min = 1, message = "name and owner_id are required")
    )]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(required(message = "name and owner_id are required"))]
    pub owner_id: Option<i32>,

    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i32>,

    /// Defaults to "member"
    pub role: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/:id/members", get(list_members).post(add_member))
        .route("/projects/:id/members/:user_id", delete(remove_member))
        .route("/projects/owner/:owner_id", get(list_by_owner))
        .route("/projects/member/:user_id", get(list_by_member))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

/// Creates a project
pub async fn create_project(
    State(state): State<AppState>,
    Payload(req): Payload<CreateProjectRequest>,
) -> ApiResult<Record<Project>> {
    let req = validated(req)?;

    let project = Project::create(
        &state.db,
        NewProject {
            name: required(req.name, PROJECT_REQUIRED)?,
            description: req.description,
            owner_id: required(req.owner_id, PROJECT_REQUIRED)?,
            status: req.status,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, owner_id = project.owner_id, "Project created");

    Ok(Envelope::record("project", project)
        .created()
        .with_message("Project created successfully"))
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Collection<Project>> {
    let projects = Project::list(&state.db).await?;
    Ok(Envelope::collection("projects", projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Param(id): Param<i32>,
) -> ApiResult<Record<Project>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::record("project", project))
}

/// Applies the fields present in the body; `owner_id` is not updatable
pub async fn update_project(
    State(state): State<AppState>,
    Param(id): Param<i32>,
    Payload(changes): Payload<ProjectChanges>,
) -> ApiResult<Record<Project>> {
    let project = Project::update(&state.db, id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::record("project", project).with_message("Project updated successfully"))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Param(id): Param<i32>,
) -> ApiResult<Envelope> {
    Project::delete(&state.db, id).await?.ok_or_else(not_found)?;

    tracing::info!(project_id = id, "Project deleted");

    Ok(Envelope::message("Project deleted successfully"))
}

/// Adds a member to an existing project
///
/// Adding the same user twice creates a second membership row.
pub async fn add_member(
    State(state): State<AppState>,
    Param(project_id): Param<i32>,
    Payload(req): Payload<AddMemberRequest>,
) -> ApiResult<Record<ProjectMember>> {
    let req = validated(req)?;
    let user_id = required(req.user_id, MEMBER_REQUIRED)?;

    if Project::find_by_id(&state.db, project_id).await?.is_none() {
        return Err(not_found());
    }

    let member = ProjectMember::add(
        &state.db,
        NewMember {
            project_id,
            user_id,
            role: req.role,
        },
    )
    .await?;

    Ok(Envelope::record("member", member)
        .created()
        .with_message("Member added successfully"))
}

pub async fn list_members(
    State(state): State<AppState>,
    Param(project_id): Param<i32>,
) -> ApiResult<Collection<ProjectMember>> {
    let members = ProjectMember::list_by_project(&state.db, project_id).await?;
    Ok(Envelope::collection("members", members))
}

/// Removes every membership of `user_id` in the project
pub async fn remove_member(
    State(state): State<AppState>,
    Param((project_id, user_id)): Param<(i32, i32)>,
) -> ApiResult<Envelope> {
    let removed = ProjectMember::remove(&state.db, project_id, user_id).await?;

    if removed.is_empty() {
        return Err(ApiError::NotFound("Member not found in project".to_string()));
    }

    Ok(Envelope::message("Member removed successfully"))
}

pub async fn list_by_owner(
    State(state): State<AppState>,
    Param(owner_id): Param<i32>,
) -> ApiResult<Collection<Project>> {
    let projects = Project::list_by_owner(&state.db, owner_id).await?;
    Ok(Envelope::collection("projects", projects))
}

pub async fn list_by_member(
    State(state): State<AppState>,
    Param(user_id): Param<i32>,
) -> ApiResult<Collection<MemberProject>> {
    let projects = Project::list_by_member(&state.db, user_id).await?;
    Ok(Envelope::collection("projects", projects))
}
