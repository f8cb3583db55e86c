//! Submission workflow tests
//!
//! Drives the public endpoints end to end: branch selection between the
//! thanks and message steps, duplicate short-circuits for the IP and session
//! strategies, validation failures and the follow-up guard rails.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    expect_json, post_from, seed_page, send, session_cookie_of, test_app, test_app_with,
    SendOptions,
};
use sitefeedback::backend::feedback::hooks::{HookRegistry, ValidationError};
use sitefeedback::backend::feedback::model::get_feedback;

#[tokio::test]
async fn negative_rating_is_invited_to_the_message_step() {
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "home", false).await;

    let response = post_from(
        &router,
        &format!("/feedback/{}", page.id),
        json!({"positive": false}),
        "203.0.113.7",
    )
    .await;

    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["step"], "message");
    assert_eq!(body["feedback"]["page"], page.id);
    assert_eq!(body["feedback"]["positive"], false);
}

#[tokio::test]
async fn positive_rating_branches_on_the_page_policy() {
    let (router, state) = test_app("ip").await;
    let strict = seed_page(&state, "strict", false).await;
    let chatty = seed_page(&state, "chatty", true).await;

    // Page disallows messages on positive feedback: straight to thanks.
    let response = post_from(
        &router,
        &format!("/feedback/{}", strict.id),
        json!({"positive": true}),
        "203.0.113.7",
    )
    .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["step"], "thanks");

    // Page allows them: the message step is offered, bound to the record.
    let response = post_from(
        &router,
        &format!("/feedback/{}", chatty.id),
        json!({"positive": true}),
        "203.0.113.8",
    )
    .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["step"], "message");
    assert!(body["feedback"]["id"].is_i64());
}

#[tokio::test]
async fn second_submission_from_the_same_address_is_rejected() {
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "home", false).await;
    let uri = format!("/feedback/{}", page.id);

    let first = post_from(&router, &uri, json!({"positive": true}), "203.0.113.7").await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_from(&router, &uri, json!({"positive": false}), "203.0.113.7").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // A different address still goes through.
    let other = post_from(&router, &uri, json!({"positive": false}), "198.51.100.9").await;
    assert_eq!(other.status(), StatusCode::OK);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
        .fetch_one(&state.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 2, "the rejected submission must not create a record");
}

#[tokio::test]
async fn forwarded_header_is_honored_when_trusted() {
    let (router, state) = test_app_with("ip", HookRegistry::new(), |config| {
        config.backend.options.trust_forwarded_for = Some(true);
    })
    .await;
    let page = seed_page(&state, "home", false).await;
    let uri = format!("/feedback/{}", page.id);

    let via_proxy = |forwarded: &'static str| {
        let router = router.clone();
        let uri = uri.clone();
        async move {
            send(
                &router,
                "POST",
                &uri,
                Some(json!({"positive": true})),
                SendOptions {
                    peer: Some("10.0.0.1"),
                    forwarded_for: Some(forwarded),
                    ..Default::default()
                },
            )
            .await
        }
    };

    // The right-most entry identifies the client hop the proxy saw.
    let first = via_proxy("203.0.113.7, 192.0.2.9").await;
    assert_eq!(first.status(), StatusCode::OK);

    let repeat = via_proxy("198.51.100.1, 192.0.2.9").await;
    assert_eq!(repeat.status(), StatusCode::CONFLICT);

    let other = via_proxy("203.0.113.7, 192.0.2.10").await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_rating_re_renders_the_form_with_errors() {
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "home", false).await;

    let response = post_from(
        &router,
        &format!("/feedback/{}", page.id),
        json!({}),
        "203.0.113.7",
    )
    .await;

    let body = expect_json(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(body["step"], "form");
    assert!(body["errors"]["fields"]["positive"].is_array());
}

#[tokio::test]
async fn hook_rejection_folds_into_non_field_errors() {
    let mut hooks = HookRegistry::new();
    hooks.before_feedback_form_valid(|_, _| Err(ValidationError::new("submissions are paused")));

    let (router, state) = test_app_with("ip", hooks, |_| {}).await;
    let page = seed_page(&state, "home", false).await;

    let response = post_from(
        &router,
        &format!("/feedback/{}", page.id),
        json!({"positive": true}),
        "203.0.113.7",
    )
    .await;

    let body = expect_json(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(body["errors"]["non_field"][0], "submissions are paused");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
        .fetch_one(&state.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let (router, _state) = test_app("ip").await;
    let response = post_from(&router, "/feedback/999", json!({"positive": true}), "203.0.113.7").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_up_message_lands_on_the_record() {
    // Message collection tracks the two phases separately, which the
    // session strategy supports and the network-address strategy does not.
    let (router, state) = test_app("session").await;
    let page = seed_page(&state, "home", false).await;

    let first = send(
        &router,
        "POST",
        &format!("/feedback/{}", page.id),
        Some(json!({"positive": false})),
        SendOptions::default(),
    )
    .await;
    let cookie = session_cookie_of(&first).expect("a fresh session cookie should be issued");
    let body = expect_json(first, StatusCode::OK).await;
    let feedback_id = body["feedback"]["id"].as_i64().unwrap();

    let response = send(
        &router,
        "POST",
        &format!("/feedback/{}/{}/message", page.id, feedback_id),
        Some(json!({"message": "the search keeps timing out"})),
        SendOptions {
            cookie: Some(&cookie),
            ..Default::default()
        },
    )
    .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["step"], "thanks");

    let record = get_feedback(&state.db_pool, feedback_id).await.unwrap().unwrap();
    assert_eq!(record.message.as_deref(), Some("the search keeps timing out"));
}

#[tokio::test]
async fn blank_follow_up_message_is_a_validation_failure() {
    let (router, state) = test_app("session").await;
    let page = seed_page(&state, "home", false).await;

    let first = send(
        &router,
        "POST",
        &format!("/feedback/{}", page.id),
        Some(json!({"positive": false})),
        SendOptions::default(),
    )
    .await;
    let cookie = session_cookie_of(&first).expect("a fresh session cookie should be issued");
    let body = expect_json(first, StatusCode::OK).await;
    let feedback_id = body["feedback"]["id"].as_i64().unwrap();

    let response = send(
        &router,
        "POST",
        &format!("/feedback/{}/{}/message", page.id, feedback_id),
        Some(json!({"message": "   "})),
        SendOptions {
            cookie: Some(&cookie),
            ..Default::default()
        },
    )
    .await;
    let body = expect_json(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(body["step"], "message");
    assert!(body["errors"]["fields"]["message"].is_array());
}

#[tokio::test]
async fn ip_backend_treats_the_follow_up_phase_as_a_repeat() {
    // The rating-phase record already matches the (address, page) lookup,
    // so the network-address strategy sees every follow-up as a duplicate.
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "home", false).await;

    let body = expect_json(
        post_from(
            &router,
            &format!("/feedback/{}", page.id),
            json!({"positive": false}),
            "203.0.113.7",
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let feedback_id = body["feedback"]["id"].as_i64().unwrap();

    let response = post_from(
        &router,
        &format!("/feedback/{}/{}/message", page.id, feedback_id),
        json!({"message": "unreachable under this strategy"}),
        "203.0.113.7",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let record = get_feedback(&state.db_pool, feedback_id).await.unwrap().unwrap();
    assert_eq!(record.message, None);
}

#[tokio::test]
async fn pages_are_addressable_by_slug() {
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "pricing", false).await;

    let response = post_from(
        &router,
        "/feedback/pricing",
        json!({"positive": true}),
        "203.0.113.7",
    )
    .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["feedback"]["page"], page.id);

    let missing = post_from(
        &router,
        "/feedback/no-such-page",
        json!({"positive": true}),
        "198.51.100.1",
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn positive_follow_up_is_forbidden_when_the_page_disallows_it() {
    let (router, state) = test_app("ip").await;
    let page = seed_page(&state, "strict", false).await;

    let body = expect_json(
        post_from(
            &router,
            &format!("/feedback/{}", page.id),
            json!({"positive": true}),
            "203.0.113.7",
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["step"], "thanks");
    let feedback_id = body["feedback"]["id"].as_i64().unwrap();

    // Rejected before any duplicate check or validation: even a blank
    // message gets the 403, not a 422.
    let response = post_from(
        &router,
        &format!("/feedback/{}/{}/message", page.id, feedback_id),
        json!({"message": ""}),
        "203.0.113.7",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_backend_tracks_the_two_phases_independently() {
    let (router, state) = test_app("session").await;
    let page = seed_page(&state, "home", false).await;
    let uri = format!("/feedback/{}", page.id);

    let first = send(
        &router,
        "POST",
        &uri,
        Some(json!({"positive": false})),
        SendOptions::default(),
    )
    .await;
    let cookie = session_cookie_of(&first).expect("a fresh session cookie should be issued");
    let body = expect_json(first, StatusCode::OK).await;
    let feedback_id = body["feedback"]["id"].as_i64().unwrap();

    // Same session, rating phase again: duplicate.
    let repeat = send(
        &router,
        "POST",
        &uri,
        Some(json!({"positive": false})),
        SendOptions {
            cookie: Some(&cookie),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(repeat.status(), StatusCode::CONFLICT);

    // The message phase runs on its own key: still open for this session.
    let message_uri = format!("/feedback/{}/{}/message", page.id, feedback_id);
    let message = send(
        &router,
        "POST",
        &message_uri,
        Some(json!({"message": "more keyboard shortcuts please"})),
        SendOptions {
            cookie: Some(&cookie),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(message.status(), StatusCode::OK);

    // And now the message phase is guarded too.
    let message_again = send(
        &router,
        "POST",
        &message_uri,
        Some(json!({"message": "again"})),
        SendOptions {
            cookie: Some(&cookie),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(message_again.status(), StatusCode::CONFLICT);

    // A different visitor (no cookie) is unaffected.
    let fresh = send(
        &router,
        "POST",
        &uri,
        Some(json!({"positive": true})),
        SendOptions::default(),
    )
    .await;
    assert_eq!(fresh.status(), StatusCode::OK);
}
