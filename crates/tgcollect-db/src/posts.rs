//! Database operations for `channel_posts`.
//!
//! Rows are append-only: this module inserts and reads, it never updates or
//! deletes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tgcollect_core::{FetchedItem, SaveOutcome};

use crate::DbError;

/// A row from the `channel_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub published_at: DateTime<Utc>,
    pub text: Option<String>,
    pub views: Option<i32>,
    pub collected_at: DateTime<Utc>,
}

/// Inserts a post unless its `(channel_id, message_id)` already exists.
///
/// The insert and the duplicate check are one statement, so concurrent
/// callers racing on the same key never error: exactly one observes
/// [`SaveOutcome::Inserted`], the rest observe [`SaveOutcome::AlreadyExists`].
/// An existing row is left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on connectivity failures, pool acquisition
/// timeouts, or any constraint violation other than the natural key.
pub async fn save_item(pool: &PgPool, item: &FetchedItem) -> Result<SaveOutcome, DbError> {
    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO channel_posts (channel_id, message_id, published_at, text, views) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (channel_id, message_id) DO NOTHING \
         RETURNING id",
    )
    .bind(item.channel_id)
    .bind(item.message_id)
    .bind(item.published_at)
    .bind(item.text.as_deref())
    .bind(item.views)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(id) => {
            tracing::debug!(
                id,
                channel_id = item.channel_id,
                message_id = item.message_id,
                "saved new post"
            );
            Ok(SaveOutcome::Inserted)
        }
        None => Ok(SaveOutcome::AlreadyExists),
    }
}

/// Fetches one post by its natural key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post(
    pool: &PgPool,
    channel_id: i64,
    message_id: i64,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, channel_id, message_id, published_at, text, views, collected_at \
         FROM channel_posts \
         WHERE channel_id = $1 AND message_id = $2",
    )
    .bind(channel_id)
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Total number of stored posts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channel_posts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of stored posts for one channel.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_channel_posts(pool: &PgPool, channel_id: i64) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channel_posts WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
