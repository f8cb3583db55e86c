/**
 * Server Configuration
 *
 * This module handles loading of server configuration from environment
 * variables, with sensible defaults for local development, and the database
 * connection setup.
 *
 * The loaded values are carried in typed structs and threaded into the
 * application state explicitly; nothing reads configuration ambiently after
 * startup.
 *
 * # Environment Variables
 *
 * - `DATABASE_URL` - SQLite URL (`sqlite://feedback.db?mode=rwc` by default)
 * - `SERVER_PORT` - listen port (8080)
 * - `FEEDBACK_BACKEND` - registry key of the duplicate-detection strategy
 *   (`ip`)
 * - `FEEDBACK_TRUST_FORWARDED_FOR` - honor `X-Forwarded-For` (false)
 * - `FEEDBACK_RATED_KEY` / `FEEDBACK_MESSAGE_KEY` - session key templates
 * - `FEEDBACK_BACKUP_BACKEND` - backup strategy for the page-delegating
 *   backend (unset)
 * - `ADMIN_JWT_SECRET` - signing secret for admin tokens
 */

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::backend::feedback::backends::{BackendConfig, BackendOptions};

/// Default development database next to the binary
pub const DEFAULT_DATABASE_URL: &str = "sqlite://feedback.db?mode=rwc";

/// Application configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub admin_jwt_secret: String,
    pub backend: BackendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: 8080,
            admin_jwt_secret: "dev-secret-change-in-production".to_string(),
            backend: BackendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut options = BackendOptions {
            trust_forwarded_for: env_bool("FEEDBACK_TRUST_FORWARDED_FOR"),
            rated_key: std::env::var("FEEDBACK_RATED_KEY").ok(),
            message_key: std::env::var("FEEDBACK_MESSAGE_KEY").ok(),
            backup_backend: std::env::var("FEEDBACK_BACKUP_BACKEND").ok(),
            backup_backend_options: None,
        };
        if options.backup_backend.is_some() {
            // The backup inherits the flat options; nested configuration is
            // for programmatic setups.
            options.backup_backend_options = Some(Box::new(backup_options(&options)));
        }

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            admin_jwt_secret: std::env::var("ADMIN_JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("ADMIN_JWT_SECRET not set; using the development secret");
                defaults.admin_jwt_secret
            }),
            backend: BackendConfig {
                class: std::env::var("FEEDBACK_BACKEND")
                    .unwrap_or_else(|_| defaults.backend.class.clone()),
                options,
            },
        }
    }
}

/// The options handed down to a configured backup strategy
///
/// The backup chain itself is stripped so a delegating backup terminates
/// instead of wrapping itself in another delegating layer.
fn backup_options(options: &BackendOptions) -> BackendOptions {
    let mut nested = options.clone();
    nested.backup_backend = None;
    nested.backup_backend_options = None;
    nested
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|value| matches!(value.as_str(), "1" | "true" | "True" | "yes"))
}

/// Create the database connection pool and run migrations
///
/// # Errors
///
/// Connection or migration failures propagate; the service is useless
/// without its store, so startup aborts.
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    // An in-memory SQLite database exists per connection; keep the pool at a
    // single connection so every query sees the same schema.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}
