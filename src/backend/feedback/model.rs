/**
 * Feedback Model and Database Operations
 *
 * This module handles the persisted feedback records and all queries over
 * them: creation, the single permitted mutation (filling in the follow-up
 * message), deletion, duplicate lookups for the network-address backend,
 * filtered listing for the admin API, and sentiment aggregation.
 *
 * # Record Lifecycle
 *
 * A record is created when a visitor's initial rating validates. It may be
 * mutated exactly once, when a follow-up submission fills in the `message`
 * field. It is never deleted except through the admin delete endpoint.
 * The duplicate-detection backends never create or delete records; they only
 * read them.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::fmt;
use std::str::FromStr;

use crate::backend::routes::urls;

/// Feedback struct representing one visitor's rating for one page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    /// Unique feedback ID
    pub id: i64,
    /// Whether the feedback is positive or negative
    pub positive: bool,
    /// The optional message of the feedback
    pub message: Option<String>,
    /// The page the feedback is for
    pub page_id: i64,
    /// Created at timestamp (set once at insert)
    pub created_at: DateTime<Utc>,
    /// The client address of the feedback, when derivable at insert time
    pub ip_address: Option<String>,
}

impl Feedback {
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    pub fn is_negative(&self) -> bool {
        !self.positive
    }

    /// Serialize a record to its external JSON representation
    ///
    /// Includes the related-resource URL set alongside the record fields:
    ///
    /// ```json
    /// {
    ///   "id": 3, "page": 1, "positive": false, "message": "...",
    ///   "created_at": "...", "ip_address": "203.0.113.7",
    ///   "urls": {"list": "...", "page_list": "...", "view": "...",
    ///            "detail": "...", "delete": "..."}
    /// }
    /// ```
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "page": self.page_id,
            "positive": self.positive,
            "message": self.message,
            "created_at": self.created_at,
            "ip_address": self.ip_address,
            "urls": {
                "list":      urls::feedback_list_url(),
                "page_list": urls::page_feedback_list_url(self.page_id),
                "view":      urls::feedback_view_url(self.page_id, self.id),
                "detail":    urls::feedback_detail_url(self.id),
                "delete":    urls::feedback_delete_url(self.id),
            },
        })
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            // Truncate on a character boundary, never mid-codepoint.
            Some(message) if message.chars().count() > 50 => {
                let prefix: String = message.chars().take(50).collect();
                write!(f, "{}... (page {})", prefix, self.page_id)
            }
            Some(message) => write!(f, "{} (page {})", message, self.page_id),
            None => {
                let rating = if self.positive { "Positive" } else { "Negative" };
                write!(f, "{} (page {})", rating, self.page_id)
            }
        }
    }
}

/// Fields for creating a new feedback record
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub positive: bool,
    pub message: Option<String>,
    pub page_id: i64,
    pub ip_address: Option<String>,
}

/// Filters shared by the admin listing and aggregation queries
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    /// Restrict to one page
    pub page_id: Option<i64>,
    /// Restrict to positive (true) or negative (false) feedback
    pub positive: Option<bool>,
    /// Creation range, inclusive start
    pub created_after: Option<DateTime<Utc>>,
    /// Creation range, exclusive end
    pub created_before: Option<DateTime<Utc>>,
}

impl FeedbackFilter {
    fn apply(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" WHERE 1 = 1");
        if let Some(page_id) = self.page_id {
            builder.push(" AND page_id = ").push_bind(page_id);
        }
        if let Some(positive) = self.positive {
            builder.push(" AND positive = ").push_bind(positive);
        }
        if let Some(after) = self.created_after {
            builder.push(" AND created_at >= ").push_bind(after);
        }
        if let Some(before) = self.created_before {
            builder.push(" AND created_at < ").push_bind(before);
        }
    }
}

/// Period buckets for sentiment aggregation, newest first
///
/// `Hour` is the default, matching the admin panel's initial view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregatePeriod {
    #[default]
    Hour,
    Date,
    Month,
    Year,
}

impl AggregatePeriod {
    /// The strftime format that produces this period's bucket label
    fn format(self) -> &'static str {
        match self {
            Self::Hour => "%Y-%m-%d %H:00",
            Self::Date => "%Y-%m-%d",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Date => "date",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for AggregatePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "date" => Ok(Self::Date),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown aggregation period `{other}`")),
        }
    }
}

/// One aggregated sentiment bucket
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    /// Bucket label, e.g. "2026-08-29 14:00" for hourly buckets
    pub period: String,
    pub total: i64,
    pub positive_count: i64,
    pub negative_count: i64,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
}

#[derive(sqlx::FromRow)]
struct RawAggregateRow {
    period: String,
    total: i64,
    positive_count: i64,
}

/// Create a new feedback record
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `new` - Record fields; `ip_address` must already be resolved by the caller
///
/// # Returns
/// Created record or error
pub async fn create_feedback(pool: &SqlitePool, new: NewFeedback) -> Result<Feedback, sqlx::Error> {
    let now = Utc::now();

    let feedback = sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedback (positive, message, page_id, created_at, ip_address)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, positive, message, page_id, created_at, ip_address
        "#,
    )
    .bind(new.positive)
    .bind(&new.message)
    .bind(new.page_id)
    .bind(now)
    .bind(&new.ip_address)
    .fetch_one(pool)
    .await?;

    Ok(feedback)
}

/// Get a feedback record by ID
pub async fn get_feedback(pool: &SqlitePool, id: i64) -> Result<Option<Feedback>, sqlx::Error> {
    let feedback = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, positive, message, page_id, created_at, ip_address
        FROM feedback
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(feedback)
}

/// Fill in a record's message (the one permitted mutation)
///
/// The page linkage is re-asserted alongside the message, matching the
/// follow-up submission that always operates under one page's URL.
///
/// # Returns
/// The updated record, or `RowNotFound` if the ID is unknown
pub async fn set_feedback_message(
    pool: &SqlitePool,
    id: i64,
    message: &str,
    page_id: i64,
) -> Result<Feedback, sqlx::Error> {
    let feedback = sqlx::query_as::<_, Feedback>(
        r#"
        UPDATE feedback SET message = ?, page_id = ?
        WHERE id = ?
        RETURNING id, positive, message, page_id, created_at, ip_address
        "#,
    )
    .bind(message)
    .bind(page_id)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(feedback)
}

/// Delete a feedback record (admin-only path)
///
/// # Returns
/// Whether a record was deleted
pub async fn delete_feedback(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether any record exists for this client address scoped to this page
///
/// Used by the network-address backend. A `None` address matches records
/// whose address was not derivable at insert time.
pub async fn exists_for_ip(
    pool: &SqlitePool,
    ip_address: Option<&str>,
    page_id: i64,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM feedback
        WHERE page_id = ? AND ip_address IS ?
        "#,
    )
    .bind(page_id)
    .bind(ip_address)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// List feedback records, newest first, with filters and offset pagination
///
/// # Arguments
/// * `filter` - Listing filters (page, sentiment, creation range)
/// * `page` - 1-based page number
/// * `page_size` - Records per page
///
/// # Returns
/// The page of records plus the total count across all pages
pub async fn list_feedback(
    pool: &SqlitePool,
    filter: &FeedbackFilter,
    page: u32,
    page_size: u32,
) -> Result<(Vec<Feedback>, i64), sqlx::Error> {
    let mut count_builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM feedback");
    filter.apply(&mut count_builder);
    let count: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

    let offset = (page.max(1) - 1) as i64 * page_size as i64;

    let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "SELECT id, positive, message, page_id, created_at, ip_address FROM feedback",
    );
    filter.apply(&mut builder);
    builder.push(" ORDER BY created_at DESC, id DESC");
    builder.push(" LIMIT ").push_bind(page_size as i64);
    builder.push(" OFFSET ").push_bind(offset);

    let records = builder.build_query_as::<Feedback>().fetch_all(pool).await?;

    Ok((records, count))
}

/// Aggregate sentiment percentages per period bucket, newest bucket first
///
/// Each bucket reports its total, the positive/negative counts and the
/// percentage split.
pub async fn aggregate_feedback(
    pool: &SqlitePool,
    filter: &FeedbackFilter,
    period: AggregatePeriod,
) -> Result<Vec<AggregateRow>, sqlx::Error> {
    let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT strftime(");
    builder.push_bind(period.format());
    builder.push(
        ", created_at) AS period, \
         COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN positive THEN 1 ELSE 0 END), 0) AS positive_count \
         FROM feedback",
    );
    filter.apply(&mut builder);
    builder.push(" GROUP BY period ORDER BY period DESC");

    let raw = builder
        .build_query_as::<RawAggregateRow>()
        .fetch_all(pool)
        .await?;

    Ok(raw
        .into_iter()
        .map(|row| {
            let negative_count = row.total - row.positive_count;
            let positive_percentage = if row.total > 0 {
                row.positive_count as f64 * 100.0 / row.total as f64
            } else {
                0.0
            };
            AggregateRow {
                period: row.period,
                total: row.total,
                positive_count: row.positive_count,
                negative_count,
                positive_percentage,
                negative_percentage: 100.0 - positive_percentage,
            }
        })
        .collect())
}
