//! Shared test helpers
//!
//! Builds the application against an in-memory SQLite database and drives it
//! through `tower::ServiceExt::oneshot`, simulating connected peers by
//! inserting `ConnectInfo` into the request extensions the way the real
//! listener does.

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use sitefeedback::backend::feedback::backends::BackendRegistry;
use sitefeedback::backend::feedback::hooks::HookRegistry;
use sitefeedback::backend::feedback::pages::{create_page, NewPage, Page};
use sitefeedback::backend::routes::router::create_router;
use sitefeedback::backend::server::config::AppConfig;
use sitefeedback::backend::server::init::build_state;
use sitefeedback::backend::server::state::AppState;

/// Build a router + state pair running the given backend strategy
pub async fn test_app(backend_class: &str) -> (Router, AppState) {
    test_app_with(backend_class, HookRegistry::new(), |_| {}).await
}

/// Build the app with hooks and a configuration tweak
pub async fn test_app_with(
    backend_class: &str,
    hooks: HookRegistry,
    tweak: impl FnOnce(&mut AppConfig),
) -> (Router, AppState) {
    let mut config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        ..AppConfig::default()
    };
    config.backend.class = backend_class.to_string();
    tweak(&mut config);

    let state = build_state(config, BackendRegistry::with_builtins(), hooks)
        .await
        .expect("state should build against in-memory sqlite");

    (create_router(state.clone()), state)
}

/// Seed a live page
pub async fn seed_page(state: &AppState, slug: &str, message_if_positive: bool) -> Page {
    create_page(
        &state.db_pool,
        NewPage {
            title: format!("Page {slug}"),
            slug: slug.to_string(),
            live: true,
            message_if_positive,
            feedback_title: None,
            feedback_thanks: Some("Thank you for your feedback.".to_string()),
        },
    )
    .await
    .expect("page should insert")
}

/// Options for one simulated request
#[derive(Default)]
pub struct SendOptions<'a> {
    pub peer: Option<&'a str>,
    pub forwarded_for: Option<&'a str>,
    pub cookie: Option<&'a str>,
    pub bearer: Option<&'a str>,
}

/// Send a request through the router
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    options: SendOptions<'_>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    if let Some(forwarded) = options.forwarded_for {
        builder = builder.header("x-forwarded-for", forwarded);
    }
    if let Some(cookie) = options.cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(token) = options.bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let mut request = builder
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .expect("request should build");

    if let Some(peer) = options.peer {
        let addr: SocketAddr = format!("{peer}:443").parse().expect("peer address");
        request.extensions_mut().insert(ConnectInfo(addr));
    }

    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

/// POST a submission from a given peer address
pub async fn post_from(
    router: &Router,
    uri: &str,
    body: serde_json::Value,
    peer: &str,
) -> Response<Body> {
    send(
        router,
        "POST",
        uri,
        Some(body),
        SendOptions {
            peer: Some(peer),
            ..Default::default()
        },
    )
    .await
}

/// Decode a JSON response body
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Assert a status and decode the body in one step
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status, "unexpected status");
    json_body(response).await
}

/// Pull the session cookie pair (`feedback_session=<uuid>`) from a response
pub fn session_cookie_of(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}
