/// Service process startup
///
/// Every binary calls [`run`] with its [`ServiceKind`]: load config, set up
/// logging, build state and router, then serve until ctrl-c or SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workhub_shared::{
    db::{
        pool::{close_pool, create_pool, health_check},
        schema::ensure_schema,
    },
    storage::{
        object_store::{ObjectStore, S3ObjectStore},
        BlobStorage,
    },
};

use crate::{
    app::{build_file_router, build_router, AppState, FileState},
    config::{Config, FileConfig, ServiceKind},
};

const DEFAULT_LOG_FILTER: &str = "workhub_api=debug,workhub_shared=info,tower_http=debug";

/// Runs one service until shutdown
///
/// # Errors
///
/// Fails on invalid configuration, an unusable database URL, an uploads
/// directory that cannot be created, or a port that cannot be bound.
/// An unreachable database is not fatal: the service starts and requests
/// fail until it comes back.
pub async fn run(service: ServiceKind) -> anyhow::Result<()> {
    let config = Config::from_env(service)?;
    init_tracing();

    info!(
        service = %service,
        version = env!("CARGO_PKG_VERSION"),
        "Starting service"
    );

    let addr = config.bind_address();

    match service {
        ServiceKind::File => {
            let files = config
                .files
                .clone()
                .ok_or_else(|| anyhow::anyhow!("{} has no file configuration", service))?;
            let storage = build_storage(&files).await;
            storage.ensure_upload_dir().await?;

            let app = build_file_router(FileState::new(storage, config)?);
            serve(&addr, service, app).await?;
        }
        _ => {
            let database = config
                .database
                .clone()
                .ok_or_else(|| anyhow::anyhow!("{} has no database configuration", service))?;
            let pool = create_pool(&database);

            if let Err(e) = health_check(&pool).await {
                warn!(error = %e, "Database not reachable at startup");
            }

            if let Some(tables) = service.tables() {
                if let Err(e) = ensure_schema(&pool, tables).await {
                    error!(error = %e, "Failed to initialize database");
                }
            }

            let app = build_router(AppState::new(pool.clone(), config));
            serve(&addr, service, app).await?;

            close_pool(pool).await;
        }
    }

    info!(service = %service, "Service stopped");
    Ok(())
}

/// Registry + env filter + fmt layer; JSON lines when `LOG_FORMAT=json`
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

/// Local storage, plus S3 when configured
async fn build_storage(files: &FileConfig) -> BlobStorage {
    match &files.s3 {
        Some(s3) => {
            info!(bucket = %s3.bucket, region = %s3.region, "Using S3 storage with local fallback");
            let remote: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(s3.clone()).await);
            BlobStorage::with_remote(&files.upload_dir, remote)
        }
        None => {
            info!(upload_dir = %files.upload_dir.display(), "Using local storage");
            BlobStorage::local(&files.upload_dir)
        }
    }
}

async fn serve(addr: &str, service: ServiceKind, app: axum::Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = %service, address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received ctrl-c, shutting down"),
        _ = terminate => warn!("Received SIGTERM, shutting down"),
    }
}
