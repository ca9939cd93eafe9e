//! Idempotent schema bootstrap for the collected-posts table.

use sqlx::PgPool;

use crate::DbError;

pub const POSTS_TABLE: &str = "channel_posts";

const CREATE_TABLE: &str = "\
    CREATE TABLE IF NOT EXISTS channel_posts ( \
        id           BIGSERIAL PRIMARY KEY, \
        channel_id   BIGINT NOT NULL, \
        message_id   BIGINT NOT NULL, \
        published_at TIMESTAMPTZ NOT NULL, \
        text         TEXT, \
        views        INTEGER, \
        collected_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
    )";

const CREATE_NATURAL_KEY_INDEX: &str = "\
    CREATE UNIQUE INDEX IF NOT EXISTS channel_posts_channel_message_idx \
    ON channel_posts (channel_id, message_id)";

const CREATE_PUBLISHED_AT_INDEX: &str = "\
    CREATE INDEX IF NOT EXISTS channel_posts_published_at_idx \
    ON channel_posts (published_at)";

/// Creates the posts table and its indexes if they are absent.
///
/// Safe to call on every process start. All three statements run in one
/// transaction so a failure never leaves the table without its unique index.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for statement in [
        CREATE_TABLE,
        CREATE_NATURAL_KEY_INDEX,
        CREATE_PUBLISHED_AT_INDEX,
    ] {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::info!(table = POSTS_TABLE, "database schema initialized");
    Ok(())
}
