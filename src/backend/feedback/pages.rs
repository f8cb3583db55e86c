/**
 * Page Model and Feedback Capabilities
 *
 * This module defines the page rows that can receive visitor feedback, plus
 * the two traits the duplicate-detection core sees pages through:
 *
 * - `FeedbackPage` - the minimal surface every rated page exposes (identity
 *   and the message-on-positive policy), with an optional capability accessor
 *   for pages that carry their own duplicate-detection logic.
 * - `PageFeedbackend` - the optional capability itself. A page type that
 *   implements it takes full control of the duplicate decision for its own
 *   submissions; the page-delegating backend checks for it before consulting
 *   any configured backup.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::Feedback;

/// A page's own duplicate-detection capability
///
/// Pages that implement this trait override feedback-duplication policy for
/// their own submissions, bypassing the globally configured backend entirely.
#[async_trait]
pub trait PageFeedbackend: Send + Sync {
    /// Decide whether this submission repeats an earlier one
    async fn check_for_feedback_duplicate(
        &self,
        request: Option<&RequestContext>,
        form: &FeedbackForm,
        exists: bool,
    ) -> Result<bool, FeedbackError>;

    /// Record whatever state the page needs to detect future duplicates
    async fn end_feedback_check(
        &self,
        request: Option<&RequestContext>,
        form: &FeedbackForm,
        record: &Feedback,
        exists: bool,
    ) -> Result<(), FeedbackError>;
}

/// The page surface the duplicate-detection core operates on
///
/// `feedbackend()` is the typed replacement for probing page objects for
/// optional methods: a page that wants bespoke duplicate logic returns
/// `Some(self)` here.
pub trait FeedbackPage: Send + Sync {
    /// Page identity, used to scope duplicate checks and session keys
    fn id(&self) -> i64;

    /// Whether a positive rating may be followed by a message
    fn allow_feedback_message_on_positive(&self) -> bool;

    /// The page's own duplicate-detection capability, if it has one
    fn feedbackend(&self) -> Option<&dyn PageFeedbackend> {
        None
    }
}

/// Page struct representing a page in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    /// Unique page ID
    pub id: i64,
    /// Page title
    pub title: String,
    /// URL slug (unique)
    pub slug: String,
    /// Whether the page is publicly visible
    pub live: bool,
    /// Allow asking for an explanation when the rating is positive
    pub message_if_positive: bool,
    /// Optional title shown above the feedback form
    pub feedback_title: Option<String>,
    /// Optional message shown after submitting feedback
    pub feedback_thanks: Option<String>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

impl FeedbackPage for Page {
    fn id(&self) -> i64 {
        self.id
    }

    fn allow_feedback_message_on_positive(&self) -> bool {
        self.message_if_positive
    }
}

/// Fields for creating a new page
#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    #[serde(default = "default_live")]
    pub live: bool,
    #[serde(default)]
    pub message_if_positive: bool,
    #[serde(default)]
    pub feedback_title: Option<String>,
    #[serde(default)]
    pub feedback_thanks: Option<String>,
}

fn default_live() -> bool {
    true
}

/// Create a new page
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `new` - Page fields
///
/// # Returns
/// Created page or error
pub async fn create_page(pool: &SqlitePool, new: NewPage) -> Result<Page, sqlx::Error> {
    let now = Utc::now();

    let page = sqlx::query_as::<_, Page>(
        r#"
        INSERT INTO pages (title, slug, live, message_if_positive, feedback_title, feedback_thanks, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, title, slug, live, message_if_positive, feedback_title, feedback_thanks, created_at
        "#,
    )
    .bind(&new.title)
    .bind(&new.slug)
    .bind(new.live)
    .bind(new.message_if_positive)
    .bind(&new.feedback_title)
    .bind(&new.feedback_thanks)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(page)
}

/// Get a live page by ID
///
/// Pages that are not live are treated as absent, matching the public
/// endpoints that only serve visible pages.
///
/// # Returns
/// Page or None if not found or not live
pub async fn get_live_page(pool: &SqlitePool, id: i64) -> Result<Option<Page>, sqlx::Error> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, live, message_if_positive, feedback_title, feedback_thanks, created_at
        FROM pages
        WHERE id = ? AND live = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

/// Get a live page by its slug
///
/// The public endpoints address pages by slug or numeric ID; this is the
/// slug half of that lookup.
pub async fn get_live_page_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Page>, sqlx::Error> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, live, message_if_positive, feedback_title, feedback_thanks, created_at
        FROM pages
        WHERE slug = ? AND live = TRUE
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

/// Get a page by ID regardless of visibility (admin views)
pub async fn get_page(pool: &SqlitePool, id: i64) -> Result<Option<Page>, sqlx::Error> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, live, message_if_positive, feedback_title, feedback_thanks, created_at
        FROM pages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}
