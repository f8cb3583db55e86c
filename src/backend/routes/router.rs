/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines the
 * public submission routes and the admin API into a single Axum router.
 *
 * # Route Order
 *
 * 1. Public submission routes (no authentication)
 * 2. Admin API routes (behind the bearer-token middleware)
 * 3. Fallback handler (404)
 *
 * Static admin segments (`/api/feedback/aggregate`) are registered alongside
 * the dynamic detail route; axum matches the static path first.
 */

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::handlers::admin::{
    aggregate_feedback_api, delete_feedback_api, feedback_detail_api, feedback_view_api,
    list_feedback_api, page_aggregate_feedback_api, page_feedback_list_api,
};
use crate::backend::handlers::public::{submit_feedback, submit_feedback_message};
use crate::backend::middleware::auth::admin_auth_middleware;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// ## Public
///
/// - `POST /feedback/{page_ref}` - initial rating submission; the page is
///   addressed by numeric ID or slug
/// - `POST /feedback/{page_ref}/{feedback_id}/message` - follow-up message
///
/// ## Admin (bearer token required)
///
/// - `GET    /api/feedback` - paginated listing
/// - `GET    /api/feedback/aggregate` - sentiment aggregation
/// - `GET    /api/feedback/{id}` - detail
/// - `DELETE /api/feedback/{id}` - delete
/// - `GET    /api/pages/{page_id}/feedback` - page-scoped listing
/// - `GET    /api/pages/{page_id}/feedback/aggregate` - page-scoped aggregation
/// - `GET    /api/pages/{page_id}/feedback/{id}` - page-scoped detail
pub fn create_router(app_state: AppState) -> Router<()> {
    let admin = Router::new()
        .route("/api/feedback", get(list_feedback_api))
        .route("/api/feedback/aggregate", get(aggregate_feedback_api))
        .route(
            "/api/feedback/{id}",
            get(feedback_detail_api).delete(delete_feedback_api),
        )
        .route("/api/pages/{page_id}/feedback", get(page_feedback_list_api))
        .route(
            "/api/pages/{page_id}/feedback/aggregate",
            get(page_aggregate_feedback_api),
        )
        .route("/api/pages/{page_id}/feedback/{id}", get(feedback_view_api))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/feedback/{page_ref}", post(submit_feedback))
        .route(
            "/feedback/{page_ref}/{feedback_id}/message",
            post(submit_feedback_message),
        )
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .with_state(app_state)
}
