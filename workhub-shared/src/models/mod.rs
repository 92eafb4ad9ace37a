/// Database models for WorkHub
///
/// This module contains all entity rows and their repository operations.
/// Repositories are stateless: every operation is an associated function
/// taking the pool explicitly and issuing a single SQL statement.
///
/// # Models
///
/// - `user`: Accounts with two projections (`User` with the password hash, `PublicUser` without)
/// - `user_profile`: One profile per user, keyed by `user_id`
/// - `project`: Projects, plus the member join (`MemberProject`)
/// - `project_member`: Project membership rows (cascade on project delete)
/// - `task`: Tasks belonging to a project
/// - `task_comment`: Comments on a task (cascade on task delete)
///
/// # Conventions
///
/// - `create` returns the persisted row, including generated id and timestamps
/// - `find_*`, `update` and `delete` return `Option`, `None` meaning no row matched
/// - `update` takes a sparse struct: `None` fields keep their stored value
/// - listings are newest first unless documented otherwise
///
/// # Example
///
/// ```no_run
/// use workhub_shared::models::project::{NewProject, Project};
/// use workhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(&DatabaseConfig::from_url("postgresql://localhost/workhub")?);
///
/// let project = Project::create(&pool, NewProject {
///     name: "Launch".to_string(),
///     owner_id: 1,
///     ..Default::default()
/// }).await?;
/// assert_eq!(project.status, "active");
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod project_member;
pub mod task;
pub mod task_comment;
pub mod user;
pub mod user_profile;
