/**
 * Public Submission Workflow
 *
 * The two visitor-facing endpoints and the state machine between them:
 *
 * ## Initial submission - `POST /feedback/{page_ref}`
 *
 * The page is addressed by numeric ID or slug.
 *
 * backend duplicate-check -> pre-validation hooks -> validate -> persist ->
 * post-validation hooks -> backend completion-notification -> next step.
 *
 * The next step depends on the rating and the page's policy: a negative
 * rating is always invited to the message step, a positive one only when the
 * page allows messages on positive feedback; everything else sees "thanks".
 *
 * ## Follow-up submission - `POST /feedback/{page_ref}/{feedback_id}/message`
 *
 * Rejected up front (403) when the record is positive and the page disallows
 * positive-feedback messages; then the same pipeline with `exists = true`,
 * mutating the existing record's message.
 *
 * At either phase a duplicate decision short-circuits to a 409 and skips
 * every remaining step. Validation failures re-render the same step as a 422
 * payload with field errors.
 *
 * There is no locking around the check-then-act pair: two concurrent
 * submissions from the same visitor can both pass `is_duplicate` before
 * either `end_check` runs. That race is accepted; duplicate feedback is low
 * stakes.
 */

use axum::extract::{Json, Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::backends::ip::client_address;
use crate::backend::feedback::backends::get_feedback_backend;
use crate::backend::feedback::context::ClientInfo;
use crate::backend::feedback::form::{FeedbackForm, FeedbackPayload};
use crate::backend::feedback::model::{create_feedback, get_feedback, set_feedback_message, NewFeedback};
use crate::backend::feedback::pages::{get_live_page, get_live_page_by_slug, FeedbackPage, Page};
use crate::backend::server::state::AppState;

/// Build a JSON response, attaching the session cookie when one was minted
fn respond(status: StatusCode, body: serde_json::Value, set_cookie: Option<String>) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Some(cookie) = set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Load the live page an endpoint operates on
///
/// The path segment is a numeric ID or a slug; a segment that parses as an
/// integer is treated as an ID.
async fn load_page(state: &AppState, page_ref: &str) -> Result<Page, FeedbackError> {
    let page = match page_ref.parse::<i64>() {
        Ok(id) => get_live_page(&state.db_pool, id).await?,
        Err(_) => get_live_page_by_slug(&state.db_pool, page_ref).await?,
    };
    page.ok_or_else(|| FeedbackError::not_found("page"))
}

/// Initial submission handler
///
/// # Errors
///
/// * `404 Not Found` - unknown or unpublished page
/// * `409 Conflict` - the backend decided this is a repeat submission
/// * `422 Unprocessable Entity` - validation failure (missing rating or a
///   hook rejection); the body carries the form errors
/// * `500 Internal Server Error` - contract violations and database faults
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(page_ref): Path<String>,
    client: ClientInfo,
    Json(payload): Json<FeedbackPayload>,
) -> Result<Response, FeedbackError> {
    let page = load_page(&state, &page_ref).await?;
    let context = client.context;
    let mut form = FeedbackForm::rating(&payload);

    let backend = get_feedback_backend(&state.backend_env, None, None)?;
    if backend
        .is_duplicate(Some(&context), &page, &form, false)
        .await?
    {
        tracing::debug!(page_id = page.id, "duplicate initial submission rejected");
        return Err(FeedbackError::duplicate());
    }

    state.hooks.run_before_feedback(Some(&context), &mut form);

    if !form.is_valid() {
        return Ok(respond(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "step": "form", "errors": form.errors }),
            client.set_cookie,
        ));
    }

    let positive = form
        .positive
        .ok_or_else(|| FeedbackError::contract("Validated rating form carries no rating."))?;

    // Stamp the client address at creation; with the network-address backend
    // active an unresolvable address breaks the creation contract.
    let ip_address = client_address(&context, state.trust_forwarded_for());
    if ip_address.is_none() && state.backend_env.config.class == "ip" {
        return Err(FeedbackError::contract(
            "A client address must be derivable while the network-address backend is active.",
        ));
    }

    let record = create_feedback(
        &state.db_pool,
        NewFeedback {
            positive,
            message: None,
            page_id: page.id,
            ip_address,
        },
    )
    .await?;

    tracing::info!(page_id = page.id, feedback_id = record.id, positive, "feedback recorded");

    state.hooks.run_after_feedback(Some(&context), &record);

    backend
        .end_check(Some(&context), &page, &form, &record, false)
        .await?;

    // A negative rating, or a positive one the page wants explained, moves
    // on to the message step bound to the record just created.
    let wants_message =
        (page.allow_feedback_message_on_positive() && record.positive) || !record.positive;

    let body = if wants_message {
        json!({ "step": "message", "feedback": record.serialize() })
    } else {
        json!({
            "step": "thanks",
            "feedback": record.serialize(),
            "thanks": page.feedback_thanks,
        })
    };

    Ok(respond(StatusCode::OK, body, client.set_cookie))
}

/// Follow-up message handler
///
/// # Errors
///
/// * `403 Forbidden` - the record is positive and the page disallows
///   positive-feedback messages (checked before everything else)
/// * `404 Not Found` - unknown page or record
/// * `409 Conflict` - the backend decided the message phase already ran
/// * `422 Unprocessable Entity` - missing or blank message
pub async fn submit_feedback_message(
    State(state): State<AppState>,
    Path((page_ref, feedback_id)): Path<(String, i64)>,
    client: ClientInfo,
    Json(payload): Json<FeedbackPayload>,
) -> Result<Response, FeedbackError> {
    let page = load_page(&state, &page_ref).await?;
    let record = get_feedback(&state.db_pool, feedback_id)
        .await?
        .ok_or_else(|| FeedbackError::not_found("feedback"))?;
    let context = client.context;

    if record.positive && !page.allow_feedback_message_on_positive() {
        return Err(FeedbackError::handler(
            StatusCode::FORBIDDEN,
            "Feedback messages are not allowed on positive feedback.",
        ));
    }

    let mut form = FeedbackForm::message(&payload);

    let backend = get_feedback_backend(&state.backend_env, None, None)?;
    if backend
        .is_duplicate(Some(&context), &page, &form, true)
        .await?
    {
        tracing::debug!(page_id = page.id, feedback_id, "duplicate message submission rejected");
        return Err(FeedbackError::duplicate());
    }

    state.hooks.run_before_message(Some(&context), &mut form);

    if !form.is_valid() {
        return Ok(respond(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "step": "message", "errors": form.errors }),
            client.set_cookie,
        ));
    }

    let message = form
        .message
        .as_deref()
        .ok_or_else(|| FeedbackError::contract("Validated message form carries no message."))?;

    let record = set_feedback_message(&state.db_pool, record.id, message, page.id).await?;

    tracing::info!(page_id = page.id, feedback_id = record.id, "feedback message recorded");

    backend
        .end_check(Some(&context), &page, &form, &record, true)
        .await?;

    state.hooks.run_after_message(Some(&context), &record);

    Ok(respond(
        StatusCode::OK,
        json!({
            "step": "thanks",
            "feedback": record.serialize(),
            "thanks": page.feedback_thanks,
        }),
        client.set_cookie,
    ))
}
