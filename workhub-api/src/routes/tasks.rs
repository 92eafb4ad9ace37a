/// Task endpoints (task service)
///
/// # Endpoints
///
/// - `POST /tasks`, `GET /tasks`
/// - `GET|PUT|DELETE /tasks/:id` (delete cascades to comments)
/// - `GET /tasks/project/:project_id`
/// - `GET /tasks/assignee/:user_id` - Soonest due date first
/// - `GET /tasks/status/:status`
/// - `POST /tasks/:id/comments`, `GET /tasks/:id/comments` - Oldest first
/// - `DELETE /tasks/comments/:comment_id`

use axum::{
    extract::State,
    routing::{delete, get},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;
use workhub_shared::models::{
    task::{NewTask, Task, TaskChanges},
    task_comment::TaskComment,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{required, validated, Param, Payload},
    response::{Collection, Envelope, Record},
};

const TASK_REQUIRED: &str = "title, project_id, and created_by are required";
const COMMENT_REQUIRED: &str = "user_id and comment are required";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "title, project_id, and created_by are required"),
        length(min = 1, message = "title, project_id, and created_by are required")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(required(message = "title, project_id, and created_by are required"))]
    pub project_id: Option<i32>,

    pub assigned_to: Option<i32>,

    #[validate(required(message = "title, project_id, and created_by are required"))]
    pub created_by: Option<i32>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Add comment request
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(required(message = "user_id and comment are required"))]
    pub user_id: Option<i32>,

    #[validate(
        required(message = "user_id and comment are required"),
        length(min = 1, message = "user_id and comment are required")
    )]
    pub comment: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/project/:project_id", get(list_by_project))
        .route("/tasks/assignee/:user_id", get(list_by_assignee))
        .route("/tasks/status/:status", get(list_by_status))
        .route("/tasks/:id/comments", get(list_comments).post(add_comment))
        .route("/tasks/comments/:comment_id", delete(delete_comment))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Creates a task
///
/// `project_id` is not checked against the project service.
pub async fn create_task(
    State(state): State<AppState>,
    Payload(req): Payload<CreateTaskRequest>,
) -> ApiResult<Record<Task>> {
    let req = validated(req)?;

    let task = Task::create(
        &state.db,
        NewTask {
            title: required(req.title, TASK_REQUIRED)?,
            description: req.description,
            project_id: required(req.project_id, TASK_REQUIRED)?,
            assigned_to: req.assigned_to,
            created_by: required(req.created_by, TASK_REQUIRED)?,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, project_id = task.project_id, "Task created");

    Ok(Envelope::record("task", task)
        .created()
        .with_message("Task created successfully"))
}

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Collection<Task>> {
    let tasks = Task::list(&state.db).await?;
    Ok(Envelope::collection("tasks", tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Param(id): Param<i32>,
) -> ApiResult<Record<Task>> {
    let task = Task::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Envelope::record("task", task))
}

/// Applies the fields present in the body
pub async fn update_task(
    State(state): State<AppState>,
    Param(id): Param<i32>,
    Payload(changes): Payload<TaskChanges>,
) -> ApiResult<Record<Task>> {
    let task = Task::update(&state.db, id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(Envelope::record("task", task).with_message("Task updated successfully"))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Param(id): Param<i32>,
) -> ApiResult<Envelope> {
    Task::delete(&state.db, id).await?.ok_or_else(not_found)?;

    tracing::info!(task_id = id, "Task deleted");

    Ok(Envelope::message("Task deleted successfully"))
}

pub async fn list_by_project(
    State(state): State<AppState>,
    Param(project_id): Param<i32>,
) -> ApiResult<Collection<Task>> {
    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Envelope::collection("tasks", tasks))
}

pub async fn list_by_assignee(
    State(state): State<AppState>,
    Param(user_id): Param<i32>,
) -> ApiResult<Collection<Task>> {
    let tasks = Task::list_by_assignee(&state.db, user_id).await?;
    Ok(Envelope::collection("tasks", tasks))
}

pub async fn list_by_status(
    State(state): State<AppState>,
    Param(status): Param<String>,
) -> ApiResult<Collection<Task>> {
    let tasks = Task::list_by_status(&state.db, &status).await?;
    Ok(Envelope::collection("tasks", tasks))
}

/// Adds a comment to an existing task
pub async fn add_comment(
    State(state): State<AppState>,
    Param(task_id): Param<i32>,
    Payload(req): Payload<AddCommentRequest>,
) -> ApiResult<Record<TaskComment>> {
    let req = validated(req)?;
    let user_id = required(req.user_id, COMMENT_REQUIRED)?;
    let comment = required(req.comment, COMMENT_REQUIRED)?;

    if Task::find_by_id(&state.db, task_id).await?.is_none() {
        return Err(not_found());
    }

    let comment = TaskComment::add(&state.db, task_id, user_id, &comment).await?;

    Ok(Envelope::record("comment", comment)
        .created()
        .with_message("Comment added successfully"))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Param(task_id): Param<i32>,
) -> ApiResult<Collection<TaskComment>> {
    let comments = TaskComment::list_by_task(&state.db, task_id).await?;
    Ok(Envelope::collection("comments", comments))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Param(comment_id): Param<i32>,
) -> ApiResult<Envelope> {
    TaskComment::delete(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Envelope::message("Comment deleted successfully"))
}
