/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server:
 * database loading, state assembly and route configuration.
 *
 * # Initialization Process
 *
 * 1. Connect the database pool and run migrations
 * 2. Populate the backend registry with the built-in strategies
 * 3. Assemble `AppState` (session store, hooks, backend environment)
 * 4. Create and configure the router
 *
 * Applications embedding the service register custom duplicate-detection
 * strategies and submission hooks through `create_app_with`.
 */

use axum::Router;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::backends::BackendRegistry;
use crate::backend::feedback::hooks::HookRegistry;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, AppConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application with default wiring
pub async fn create_app(config: AppConfig) -> Result<Router, FeedbackError> {
    create_app_with(config, BackendRegistry::with_builtins(), HookRegistry::new()).await
}

/// Create the application with custom backend registrations and hooks
///
/// # Arguments
///
/// * `config` - Resolved configuration
/// * `registry` - Backend registry; start from
///   `BackendRegistry::with_builtins()` and add custom strategies
/// * `hooks` - Submission extension hooks
pub async fn create_app_with(
    config: AppConfig,
    registry: BackendRegistry,
    hooks: HookRegistry,
) -> Result<Router, FeedbackError> {
    let state = build_state(config, registry, hooks).await?;
    Ok(create_router(state))
}

/// Connect the database and assemble the application state
///
/// Split out so tests can reach the state without a running server.
pub async fn build_state(
    config: AppConfig,
    registry: BackendRegistry,
    hooks: HookRegistry,
) -> Result<AppState, FeedbackError> {
    let pool = load_database(&config.database_url).await?;

    tracing::info!(
        backend = %config.backend.class,
        "feedback backend configured"
    );

    Ok(AppState::new(pool, config, registry, hooks))
}
