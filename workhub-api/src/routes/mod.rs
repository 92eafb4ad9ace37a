/// Request handlers, one module per service
///
/// - `auth`: Registration, login and account lookups (auth service)
/// - `profiles`: User profiles (user service)
/// - `projects`: Projects and their members (project service)
/// - `tasks`: Tasks and their comments (task service)
/// - `files`: Uploads, downloads and signed URLs (file service)
/// - `health`: Liveness endpoint mounted by every service

pub mod auth;
pub mod files;
pub mod health;
pub mod profiles;
pub mod projects;
pub mod tasks;
