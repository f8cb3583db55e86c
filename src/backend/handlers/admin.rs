/**
 * Admin Feedback API
 *
 * Editor-facing endpoints behind the bearer-token middleware:
 *
 * - `GET  /api/feedback` - paginated listing with filters
 * - `GET  /api/feedback/aggregate` - sentiment percentages per period bucket
 * - `GET  /api/feedback/{id}` - serialized detail
 * - `DELETE /api/feedback/{id}` - the only deletion path
 * - `GET  /api/pages/{page_id}/feedback` - page-scoped listing
 * - `GET  /api/pages/{page_id}/feedback/aggregate` - page-scoped aggregation
 * - `GET  /api/pages/{page_id}/feedback/{id}` - page-scoped detail
 *
 * Listing responses carry offset pagination with ready-made `next` /
 * `previous` URLs (path plus rewritten query string), newest records first.
 */

use axum::extract::{Json, OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::model::{
    aggregate_feedback, delete_feedback, get_feedback, list_feedback, AggregatePeriod,
    FeedbackFilter,
};
use crate::backend::feedback::pages::get_page;
use crate::backend::server::state::AppState;

/// Query parameter selecting the listing page
pub const PAGE_PARAM: &str = "page";

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Listing and aggregation query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    /// 1-based listing page
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Restrict to positive (true) or negative (false) records
    pub positive: Option<bool>,
    /// Creation range start, RFC 3339 or `YYYY-MM-DD`
    pub created_after: Option<String>,
    /// Creation range end, RFC 3339 or `YYYY-MM-DD`
    pub created_before: Option<String>,
    /// Aggregation bucket size
    pub period: Option<AggregatePeriod>,
}

/// Parse a range bound as RFC 3339 or a plain date at midnight UTC
fn parse_bound(value: &str) -> Result<DateTime<Utc>, FeedbackError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = value.parse::<NaiveDate>() {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc());
    }
    Err(FeedbackError::handler(
        StatusCode::BAD_REQUEST,
        format!("Invalid date `{value}`; expected RFC 3339 or YYYY-MM-DD."),
    ))
}

impl FeedbackQuery {
    fn filter(&self, page_id: Option<i64>) -> Result<FeedbackFilter, FeedbackError> {
        Ok(FeedbackFilter {
            page_id,
            positive: self.positive,
            created_after: self.created_after.as_deref().map(parse_bound).transpose()?,
            created_before: self.created_before.as_deref().map(parse_bound).transpose()?,
        })
    }

    fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Rebuild the request URL with the page parameter set to `page`
fn page_url(path: &str, query: Option<&str>, page: u32) -> String {
    let mut pairs: Vec<String> = query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();
    pairs.push(format!("{PAGE_PARAM}={page}"));
    format!("{path}?{}", pairs.join("&"))
}

/// Paginated listing envelope shared by both list endpoints
async fn listing(
    state: &AppState,
    uri: &OriginalUri,
    query: &FeedbackQuery,
    page_id: Option<i64>,
) -> Result<serde_json::Value, FeedbackError> {
    let filter = query.filter(page_id)?;
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size();

    let (records, count) = list_feedback(&state.db_pool, &filter, page, page_size).await?;

    let pages = ((count as u64).div_ceil(page_size as u64)).max(1) as u32;
    let path = uri.path();
    let raw_query = uri.query();

    let mut body = json!({
        "page": page,
        "pages": pages,
        "count": count,
        "results": records.iter().map(|record| record.serialize()).collect::<Vec<_>>(),
    });

    if page < pages {
        body["next"] = json!(page_url(path, raw_query, page + 1));
    }
    if page > 1 {
        body["previous"] = json!(page_url(path, raw_query, page - 1));
    }

    Ok(body)
}

/// Aggregation envelope shared by both aggregate endpoints
async fn aggregation(
    state: &AppState,
    query: &FeedbackQuery,
    page_id: Option<i64>,
) -> Result<serde_json::Value, FeedbackError> {
    let filter = query.filter(page_id)?;
    let period = query.period.unwrap_or_default();

    let rows = aggregate_feedback(&state.db_pool, &filter, period).await?;

    Ok(json!({
        "period": period.as_str(),
        "count": rows.len(),
        "results": rows,
    }))
}

/// Resolve a page or 404, for the page-scoped endpoints
async fn require_page(state: &AppState, page_id: i64) -> Result<i64, FeedbackError> {
    get_page(&state.db_pool, page_id)
        .await?
        .map(|page| page.id)
        .ok_or_else(|| FeedbackError::not_found("page"))
}

/// `GET /api/feedback`
pub async fn list_feedback_api(
    State(state): State<AppState>,
    uri: OriginalUri,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    Ok(Json(listing(&state, &uri, &query, None).await?))
}

/// `GET /api/pages/{page_id}/feedback`
pub async fn page_feedback_list_api(
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(page_id): Path<i64>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    let page_id = require_page(&state, page_id).await?;
    Ok(Json(listing(&state, &uri, &query, Some(page_id)).await?))
}

/// `GET /api/feedback/aggregate`
pub async fn aggregate_feedback_api(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    Ok(Json(aggregation(&state, &query, None).await?))
}

/// `GET /api/pages/{page_id}/feedback/aggregate`
pub async fn page_aggregate_feedback_api(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    let page_id = require_page(&state, page_id).await?;
    Ok(Json(aggregation(&state, &query, Some(page_id)).await?))
}

/// `GET /api/feedback/{id}`
pub async fn feedback_detail_api(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    let record = get_feedback(&state.db_pool, id)
        .await?
        .ok_or_else(|| FeedbackError::not_found("feedback"))?;
    Ok(Json(record.serialize()))
}

/// `GET /api/pages/{page_id}/feedback/{id}` - 404 unless the record belongs to the page
pub async fn feedback_view_api(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, FeedbackError> {
    let page_id = require_page(&state, page_id).await?;
    let record = get_feedback(&state.db_pool, id)
        .await?
        .filter(|record| record.page_id == page_id)
        .ok_or_else(|| FeedbackError::not_found("feedback"))?;
    Ok(Json(record.serialize()))
}

/// `DELETE /api/feedback/{id}`
pub async fn delete_feedback_api(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FeedbackError> {
    if delete_feedback(&state.db_pool, id).await? {
        tracing::info!(feedback_id = id, "feedback deleted by administrator");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(FeedbackError::not_found("feedback"))
    }
}
