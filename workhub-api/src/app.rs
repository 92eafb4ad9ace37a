/// Application state and router builders
///
/// Each service gets its own router: the database-backed services share
/// [`AppState`], the file service uses [`FileState`]. All routers get the
/// same `/health` endpoint and middleware stack.
///
/// # Example
///
/// ```no_run
/// use workhub_api::{app::{build_router, AppState}, config::{Config, ServiceKind}};
/// use workhub_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env(ServiceKind::Task)?;
/// let pool = create_pool(config.database.as_ref().expect("task service has a database"));
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:4004").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workhub_shared::storage::BlobStorage;

use crate::{
    config::{Config, FileConfig, JwtConfig, ServiceKind},
    error::{ApiError, ApiResult},
    middleware::{error_detail::attach_error_detail, security::SecurityHeadersLayer},
    routes,
};

/// Shared state of the database-backed services
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Service configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// JWT settings; only the auth service has them
    pub fn jwt(&self) -> ApiResult<&JwtConfig> {
        self.config
            .jwt
            .as_ref()
            .ok_or_else(|| ApiError::internal("JWT is not configured for this service"))
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// State of the file service
#[derive(Clone)]
pub struct FileState {
    pub storage: Arc<BlobStorage>,
    pub files: Arc<FileConfig>,
    pub config: Arc<Config>,
}

impl FileState {
    /// # Errors
    ///
    /// Fails if `config` has no file section, i.e. was not loaded for the
    /// file service.
    pub fn new(storage: BlobStorage, config: Config) -> anyhow::Result<Self> {
        let files = config
            .files
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{} has no file configuration", config.service))?;

        Ok(Self {
            storage: Arc::new(storage),
            files: Arc::new(files),
            config: Arc::new(config),
        })
    }
}

impl FromRef<FileState> for Arc<Config> {
    fn from_ref(state: &FileState) -> Self {
        state.config.clone()
    }
}

/// Builds the router of a database-backed service
///
/// The routes mounted depend on `state.config.service`:
///
/// ```text
/// Auth     /auth/register, /auth/login, /auth/me, /auth/password, /auth/users[/:id]
/// User     /users/profile[/:user_id], /users/profiles[/role/:role]
/// Project  /projects[/:id[/members[/:user_id]]], /projects/owner/:id, /projects/member/:id
/// Task     /tasks[/:id[/comments]], /tasks/{project,assignee,status}/:v, /tasks/comments/:id
/// ```
///
/// Given a file-service config it mounts `/health` only; use
/// [`build_file_router`] for that service.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let routes = match config.service {
        ServiceKind::Auth => routes::auth::router(state.clone()),
        ServiceKind::User => routes::profiles::router(),
        ServiceKind::Project => routes::projects::router(),
        ServiceKind::Task => routes::tasks::router(),
        ServiceKind::File => Router::new(),
    };

    let router = routes
        .route("/health", get(routes::health::health_check))
        .with_state(state);

    with_common_layers(router, &config)
}

/// Builds the router of the file service
pub fn build_file_router(state: FileState) -> Router {
    let config = state.config.clone();
    let body_limit = state.files.max_request_size();

    let router = routes::files::router()
        .route("/health", get(routes::health::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    with_common_layers(router, &config)
}

/// Tracing, CORS, security headers and, in diagnostic mode, error details
fn with_common_layers(router: Router, config: &Config) -> Router {
    let router = if config.api.expose_error_details {
        router.layer(axum::middleware::map_response(attach_error_detail))
    } else {
        router
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(config))
        .layer(SecurityHeadersLayer::new(config.api.production))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
