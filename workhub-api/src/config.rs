/// Configuration management for the services
///
/// Every service binary loads its configuration from environment variables
/// (optionally seeded from a `.env` file). Only the sections a service needs
/// are loaded: the file service has no database, and only the auth service
/// requires a JWT secret.
///
/// # Environment Variables
///
/// - `PORT` / `API_PORT`: Port to bind to (default: per service, 4001-4005)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `APP_ENV` / `NODE_ENV`: `production` enables HSTS, `development` exposes
///   error details in 500 responses
/// - `DATABASE_URL`: PostgreSQL connection string, or the individual
///   `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_DATABASE`
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (auth only)
/// - `JWT_EXPIRES_IN_HOURS`: Token lifetime (default: 24)
/// - `UPLOAD_DIR`, `PUBLIC_BASE_URL`, `MAX_FILE_SIZE_BYTES`: File service
/// - `USE_S3`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`,
///   `AWS_S3_BUCKET_NAME`, `AWS_S3_ENDPOINT`: Remote object store
///
/// # Example
///
/// ```no_run
/// use workhub_api::config::{Config, ServiceKind};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env(ServiceKind::Project)?;
/// println!("{} will listen on {}", config.service.display_name(), config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, fmt, path::PathBuf};

use sqlx::postgres::PgConnectOptions;
use workhub_shared::{db::pool::DatabaseConfig, db::schema::TableSet, storage::S3Config};

/// The five services built from this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Auth,
    User,
    Project,
    Task,
    File,
}

impl ServiceKind {
    /// Name reported by `/health`
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Auth => "Auth Service",
            ServiceKind::User => "User Service",
            ServiceKind::Project => "Project Service",
            ServiceKind::Task => "Task Service",
            ServiceKind::File => "File Service",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Auth => 4001,
            ServiceKind::User => 4002,
            ServiceKind::Project => 4003,
            ServiceKind::Task => 4004,
            ServiceKind::File => 4005,
        }
    }

    /// Tables this service creates at startup; `None` for the file service
    pub fn tables(&self) -> Option<TableSet> {
        match self {
            ServiceKind::Auth => Some(TableSet::Users),
            ServiceKind::User => Some(TableSet::Profiles),
            ServiceKind::Project => Some(TableSet::Projects),
            ServiceKind::Task => Some(TableSet::Tasks),
            ServiceKind::File => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceKind,

    /// HTTP server configuration
    pub api: ApiConfig,

    /// Present for every service except the file service
    pub database: Option<DatabaseConfig>,

    /// Present for the auth service only
    pub jwt: Option<JwtConfig>,

    /// Present for the file service only
    pub files: Option<FileConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,

    /// Adds the underlying failure to 500 responses as `error`
    pub expose_error_details: bool,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub expires_in_hours: i64,
}

impl JwtConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expires_in_hours)
    }
}

/// File service configuration
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Staging directory, also serves as the local fallback store
    pub upload_dir: PathBuf,

    /// Base of generated local URLs; derived from the request `Host` when unset
    pub public_base_url: Option<String>,

    /// Per-file size limit in bytes
    pub max_file_size: usize,

    /// Remote object store, when `USE_S3=true` and credentials are present
    pub s3: Option<S3Config>,
}

impl FileConfig {
    /// Most files accepted by a single multi-file upload
    pub const MAX_FILES: usize = 10;

    /// Upper bound for a whole multipart request body
    pub fn max_request_size(&self) -> usize {
        self.max_file_size
            .saturating_mul(Self::MAX_FILES)
            .saturating_add(64 * 1024)
    }
}

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

impl Config {
    /// Loads configuration for `service` from the process environment
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env(service: ServiceKind) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(service, |name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(service: ServiceKind, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .unwrap_or_default()
            .to_lowercase();

        let port = match var("PORT").or_else(|| var("API_PORT")) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?,
            None => service.default_port(),
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let api = ApiConfig {
            host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cors_origins,
            production: environment == "production",
            expose_error_details: environment == "development",
        };

        let database = match service {
            ServiceKind::File => None,
            _ => Some(load_database(&var)?),
        };

        let jwt = match service {
            ServiceKind::Auth => Some(load_jwt(&var)?),
            _ => None,
        };

        let files = match service {
            ServiceKind::File => Some(load_files(&var)?),
            _ => None,
        };

        Ok(Self {
            service,
            api,
            database,
            jwt,
            files,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn load_database(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<DatabaseConfig> {
    let connect_options = match var("DATABASE_URL") {
        Some(url) => url
            .parse::<PgConnectOptions>()
            .map_err(|e| anyhow::anyhow!("Invalid DATABASE_URL: {}", e))?,
        None => {
            let port = match var("DB_PORT") {
                Some(port) => port
                    .parse::<u16>()
                    .map_err(|e| anyhow::anyhow!("Invalid DB_PORT '{}': {}", port, e))?,
                None => 5432,
            };

            let options = PgConnectOptions::new()
                .host(&var("DB_HOST").unwrap_or_else(|| "localhost".to_string()))
                .port(port)
                .username(&var("DB_USER").unwrap_or_else(|| "postgres".to_string()))
                .database(&var("DB_DATABASE").unwrap_or_else(|| "workhub".to_string()));

            match var("DB_PASSWORD") {
                Some(password) => options.password(&password),
                None => options,
            }
        }
    };

    let mut database = DatabaseConfig::new(connect_options);
    if let Some(value) = var("DATABASE_MAX_CONNECTIONS") {
        database.max_connections = value.parse::<u32>()?;
    }

    Ok(database)
}

fn load_jwt(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<JwtConfig> {
    let secret = var("JWT_SECRET")
        .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

    if secret.len() < 32 {
        anyhow::bail!("JWT_SECRET must be at least 32 characters long");
    }

    let expires_in_hours = match var("JWT_EXPIRES_IN_HOURS") {
        Some(value) => value.parse::<i64>()?,
        None => 24,
    };

    if expires_in_hours <= 0 {
        anyhow::bail!("JWT_EXPIRES_IN_HOURS must be positive");
    }

    Ok(JwtConfig {
        secret,
        expires_in_hours,
    })
}

fn load_files(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<FileConfig> {
    let max_file_size = match var("MAX_FILE_SIZE_BYTES") {
        Some(value) => value.parse::<usize>()?,
        None => DEFAULT_MAX_FILE_SIZE,
    };

    let use_s3 = var("USE_S3").is_some_and(|value| value == "true");

    let s3 = match (use_s3, var("AWS_ACCESS_KEY_ID"), var("AWS_S3_BUCKET_NAME")) {
        (true, Some(access_key_id), Some(bucket)) => Some(S3Config {
            bucket,
            region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id,
            secret_access_key: var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            endpoint: var("AWS_S3_ENDPOINT"),
        }),
        _ => None,
    };

    Ok(FileConfig {
        upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
        public_base_url: var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
        max_file_size,
        s3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(service: ServiceKind, vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(service, |name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_per_service() {
        let config = load(ServiceKind::Task, &[]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:4004");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.expose_error_details);
        assert!(!config.api.production);
        assert!(config.jwt.is_none());
        assert!(config.files.is_none());

        let database = config.database.unwrap();
        assert_eq!(database.connect_options.get_host(), "localhost");
        assert_eq!(database.connect_options.get_port(), 5432);
        assert_eq!(database.connect_options.get_username(), "postgres");
        assert_eq!(database.connect_options.get_database(), Some("workhub"));
        assert_eq!(database.max_connections, 10);
    }

    #[test]
    fn test_port_override() {
        let config = load(ServiceKind::User, &[("PORT", "9000")]).unwrap();
        assert_eq!(config.api.port, 9000);

        let config = load(ServiceKind::User, &[("API_PORT", "9001")]).unwrap();
        assert_eq!(config.api.port, 9001);

        assert!(load(ServiceKind::User, &[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_database_from_parts() {
        let config = load(
            ServiceKind::Project,
            &[
                ("DB_HOST", "db"),
                ("DB_PORT", "6543"),
                ("DB_USER", "app"),
                ("DB_PASSWORD", "p@ss:word"),
                ("DB_DATABASE", "projects"),
                ("DATABASE_MAX_CONNECTIONS", "4"),
            ],
        )
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.connect_options.get_host(), "db");
        assert_eq!(database.connect_options.get_port(), 6543);
        assert_eq!(database.connect_options.get_username(), "app");
        assert_eq!(database.connect_options.get_database(), Some("projects"));
        assert_eq!(database.max_connections, 4);
    }

    #[test]
    fn test_invalid_database_settings() {
        assert!(load(ServiceKind::Task, &[("DB_PORT", "five")]).is_err());
        assert!(load(ServiceKind::Task, &[("DATABASE_URL", "not a url")]).is_err());
        assert!(load(ServiceKind::Task, &[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
    }

    #[test]
    fn test_database_url_wins() {
        let config = load(
            ServiceKind::Project,
            &[("DATABASE_URL", "postgresql://x@y/z"), ("DB_HOST", "ignored")],
        )
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.connect_options.get_host(), "y");
        assert_eq!(database.connect_options.get_username(), "x");
        assert_eq!(database.connect_options.get_database(), Some("z"));
    }

    #[test]
    fn test_environment_modes() {
        let config = load(ServiceKind::Task, &[("NODE_ENV", "production")]).unwrap();
        assert!(config.api.production);
        assert!(!config.api.expose_error_details);

        let config = load(
            ServiceKind::Task,
            &[("APP_ENV", "development"), ("NODE_ENV", "production")],
        )
        .unwrap();
        assert!(config.api.expose_error_details);

        let config = load(ServiceKind::Task, &[("APP_ENV", "test")]).unwrap();
        assert!(!config.api.expose_error_details);
    }

    #[test]
    fn test_auth_requires_jwt_secret() {
        assert!(load(ServiceKind::Auth, &[]).is_err());
        assert!(load(ServiceKind::Auth, &[("JWT_SECRET", "short")]).is_err());

        let config = load(
            ServiceKind::Auth,
            &[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN_HOURS", "2")],
        )
        .unwrap();
        let jwt = config.jwt.unwrap();
        assert_eq!(jwt.secret, SECRET);
        assert_eq!(jwt.ttl(), chrono::Duration::hours(2));
    }

    #[test]
    fn test_file_service_has_no_database() {
        let config = load(ServiceKind::File, &[("PUBLIC_BASE_URL", "https://files.example/")]).unwrap();

        assert!(config.database.is_none());
        let files = config.files.unwrap();
        assert_eq!(files.upload_dir, PathBuf::from("uploads"));
        assert_eq!(files.public_base_url.as_deref(), Some("https://files.example"));
        assert_eq!(files.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(files.s3.is_none());
    }

    #[test]
    fn test_s3_requires_flag_and_credentials() {
        let config = load(
            ServiceKind::File,
            &[("AWS_ACCESS_KEY_ID", "id"), ("AWS_S3_BUCKET_NAME", "bucket")],
        )
        .unwrap();
        assert!(config.files.unwrap().s3.is_none());

        let config = load(
            ServiceKind::File,
            &[("USE_S3", "true"), ("AWS_S3_BUCKET_NAME", "bucket")],
        )
        .unwrap();
        assert!(config.files.unwrap().s3.is_none());

        let config = load(
            ServiceKind::File,
            &[
                ("USE_S3", "true"),
                ("AWS_ACCESS_KEY_ID", "id"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("AWS_S3_BUCKET_NAME", "bucket"),
                ("AWS_REGION", "eu-central-1"),
            ],
        )
        .unwrap();
        let s3 = config.files.unwrap().s3.unwrap();
        assert_eq!(s3.bucket, "bucket");
        assert_eq!(s3.region, "eu-central-1");
        assert!(s3.endpoint.is_none());
    }

    #[test]
    fn test_service_metadata() {
        assert_eq!(ServiceKind::Auth.display_name(), "Auth Service");
        assert_eq!(ServiceKind::File.to_string(), "File Service");
        assert_eq!(ServiceKind::Task.tables(), Some(TableSet::Tasks));
        assert_eq!(ServiceKind::File.tables(), None);
        assert_eq!(ServiceKind::Project.default_port(), 4003);
    }
}
