/**
 * Application State Management
 *
 * This module defines the application state structure shared by all
 * handlers.
 *
 * # Thread Safety
 *
 * All state is designed to be thread-safe:
 * - `SqlitePool` is internally pooled and cloneable
 * - `SessionStore` wraps its map in `Arc<RwLock<...>>`
 * - Configuration, hooks and the backend registry are immutable after
 *   startup and shared through `Arc`
 */

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::backend::feedback::backends::{BackendEnv, BackendRegistry};
use crate::backend::feedback::hooks::HookRegistry;
use crate::backend::feedback::session_store::SessionStore;
use crate::backend::server::config::AppConfig;

/// Central state container for the feedback service
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db_pool: SqlitePool,
    /// Resolved configuration
    pub config: Arc<AppConfig>,
    /// Visitor session flags for the session backend
    pub sessions: SessionStore,
    /// Submission extension hooks
    pub hooks: Arc<HookRegistry>,
    /// Backend resolution environment (pool + registry + configured selection)
    pub backend_env: BackendEnv,
}

impl AppState {
    /// Assemble the state from its startup ingredients
    pub fn new(
        db_pool: SqlitePool,
        config: AppConfig,
        registry: BackendRegistry,
        hooks: HookRegistry,
    ) -> Self {
        let config = Arc::new(config);
        let backend_env = BackendEnv {
            pool: db_pool.clone(),
            registry: Arc::new(registry),
            config: Arc::new(config.backend.clone()),
        };

        Self {
            db_pool,
            config,
            sessions: SessionStore::new(),
            hooks: Arc::new(hooks),
            backend_env,
        }
    }

    /// Whether client addresses are taken from `X-Forwarded-For`
    pub fn trust_forwarded_for(&self) -> bool {
        self.config
            .backend
            .options
            .trust_forwarded_for
            .unwrap_or(false)
    }
}
