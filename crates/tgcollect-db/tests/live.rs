//! Live integration tests for tgcollect-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, empty Postgres database from the sqlx test
//! harness. The schema is created by `init_schema`, exactly as the collector
//! does at startup, rather than by a migration directory.

use chrono::{TimeZone, Utc};
use tgcollect_core::{FetchedItem, SaveOutcome};
use tgcollect_db::{
    count_channel_posts, count_posts, get_post, health_check, init_schema, save_item,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_item(channel_id: i64, message_id: i64, text: Option<&str>) -> FetchedItem {
    FetchedItem {
        channel_id,
        message_id,
        published_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        text: text.map(str::to_string),
        views: Some(10),
    }
}

async fn fresh_schema(pool: &sqlx::PgPool) {
    init_schema(pool).await.expect("init_schema failed");
}

// ---------------------------------------------------------------------------
// Section 1: Schema
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn init_schema_is_idempotent(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;
    fresh_schema(&pool).await;

    let index_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pg_indexes \
         WHERE tablename = 'channel_posts' \
         AND indexname IN ('channel_posts_channel_message_idx', 'channel_posts_published_at_idx')",
    )
    .fetch_one(&pool)
    .await
    .expect("index query failed");

    assert_eq!(index_count, 2);
    assert_eq!(count_posts(&pool).await.expect("count failed"), 0);
}

#[sqlx::test(migrations = false)]
async fn health_check_succeeds_on_live_pool(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health_check failed");
}

// ---------------------------------------------------------------------------
// Section 2: Idempotent saves
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn save_item_inserts_then_reports_existing(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;
    let item = make_item(-100_111, 7, Some("hello"));

    let first = save_item(&pool, &item).await.expect("first save failed");
    let second = save_item(&pool, &item).await.expect("second save failed");

    assert_eq!(first, SaveOutcome::Inserted);
    assert_eq!(second, SaveOutcome::AlreadyExists);
    assert_eq!(count_posts(&pool).await.expect("count failed"), 1);
}

#[sqlx::test(migrations = false)]
async fn duplicate_save_leaves_original_row_untouched(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;
    save_item(&pool, &make_item(-100_111, 7, Some("original")))
        .await
        .expect("first save failed");

    let mut edited = make_item(-100_111, 7, Some("edited"));
    edited.views = Some(999);
    let outcome = save_item(&pool, &edited).await.expect("second save failed");

    let row = get_post(&pool, -100_111, 7)
        .await
        .expect("get_post failed")
        .expect("row should exist");

    assert_eq!(outcome, SaveOutcome::AlreadyExists);
    assert_eq!(row.text.as_deref(), Some("original"));
    assert_eq!(row.views, Some(10));
}

#[sqlx::test(migrations = false)]
async fn same_message_id_in_different_channels_are_distinct(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;

    let a = save_item(&pool, &make_item(-100_111, 1, None))
        .await
        .expect("save a failed");
    let b = save_item(&pool, &make_item(-100_222, 1, None))
        .await
        .expect("save b failed");

    assert_eq!(a, SaveOutcome::Inserted);
    assert_eq!(b, SaveOutcome::Inserted);
    assert_eq!(count_channel_posts(&pool, -100_111).await.expect("count"), 1);
    assert_eq!(count_channel_posts(&pool, -100_222).await.expect("count"), 1);
}

#[sqlx::test(migrations = false)]
async fn empty_text_and_missing_views_are_stored_as_null(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;
    let mut item = make_item(-100_333, 5, None);
    item.views = None;

    save_item(&pool, &item).await.expect("save failed");
    let row = get_post(&pool, -100_333, 5)
        .await
        .expect("get_post failed")
        .expect("row should exist");

    assert!(row.text.is_none());
    assert!(row.views.is_none());
    assert_eq!(row.published_at, item.published_at);
}

#[sqlx::test(migrations = false)]
async fn concurrent_saves_of_same_key_insert_exactly_once(pool: sqlx::PgPool) {
    fresh_schema(&pool).await;
    let item = make_item(-100_444, 99, Some("race"));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        let item = item.clone();
        handles.push(tokio::spawn(async move { save_item(&pool, &item).await }));
    }

    let mut inserted = 0;
    let mut existing = 0;
    for handle in handles {
        match handle.await.expect("task panicked").expect("save failed") {
            SaveOutcome::Inserted => inserted += 1,
            SaveOutcome::AlreadyExists => existing += 1,
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(existing, 15);
    assert_eq!(count_posts(&pool).await.expect("count failed"), 1);
}
