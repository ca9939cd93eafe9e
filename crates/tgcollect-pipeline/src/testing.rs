//! In-memory fakes for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tgcollect_core::{ChannelRef, FetchedItem, ResolvedChannel, SaveOutcome};
use tgcollect_db::DbError;
use tgcollect_remote::RemoteError;

use crate::channel::CollectSettings;
use crate::source::{ChannelSource, ItemStore};

pub(crate) fn reference(raw: &str) -> ChannelRef {
    ChannelRef::parse(raw).expect("valid channel reference")
}

pub(crate) fn resolved(id: i64) -> ResolvedChannel {
    ResolvedChannel {
        id,
        title: None,
        username: None,
    }
}

pub(crate) fn settings() -> CollectSettings {
    CollectSettings {
        messages_limit: 50,
        max_rate_limit_wait: Duration::from_secs(3600),
    }
}

pub(crate) fn item(channel_id: i64, message_id: i64) -> FetchedItem {
    FetchedItem {
        channel_id,
        message_id,
        published_at: Utc
            .timestamp_opt(1_714_564_800 + message_id, 0)
            .single()
            .expect("valid timestamp"),
        text: Some(format!("message {message_id}")),
        views: Some(1),
    }
}

/// Items for `ids`, newest first, the way the remote returns them.
pub(crate) fn items(channel_id: i64, ids: RangeInclusive<i64>) -> Vec<FetchedItem> {
    ids.rev().map(|id| item(channel_id, id)).collect()
}

#[derive(Default)]
pub(crate) struct FakeSource {
    resolutions: HashMap<String, Result<ResolvedChannel, RemoteError>>,
    fetches: HashMap<i64, Result<Vec<FetchedItem>, RemoteError>>,
    panic_on: HashSet<i64>,
    fetch_delay: Option<Duration>,
    pub resolve_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub last_limit: AtomicU32,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A channel that resolves to `id` and answers fetches with `fetch`.
    pub(crate) fn channel(
        mut self,
        raw: &str,
        id: i64,
        fetch: Result<Vec<FetchedItem>, RemoteError>,
    ) -> Self {
        self.resolutions.insert(raw.to_string(), Ok(resolved(id)));
        self.fetches.insert(id, fetch);
        self
    }

    /// A reference whose resolution fails with `err`.
    pub(crate) fn unresolvable(mut self, raw: &str, err: RemoteError) -> Self {
        self.resolutions.insert(raw.to_string(), Err(err));
        self
    }

    /// A channel whose fetch panics.
    pub(crate) fn panicking(mut self, raw: &str, id: i64) -> Self {
        self.resolutions.insert(raw.to_string(), Ok(resolved(id)));
        self.panic_on.insert(id);
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }
}

#[async_trait]
impl ChannelSource for FakeSource {
    async fn resolve(&self, reference: &ChannelRef) -> Result<ResolvedChannel, RemoteError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.resolutions
            .get(reference.as_str())
            .cloned()
            .unwrap_or_else(|| {
                Err(RemoteError::InvalidReference {
                    reference: reference.to_string(),
                    reason: "USERNAME_NOT_OCCUPIED".to_string(),
                })
            })
    }

    async fn fetch_recent(
        &self,
        channel: &ResolvedChannel,
        limit: u32,
    ) -> Result<Vec<FetchedItem>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        assert!(
            !self.panic_on.contains(&channel.id),
            "fake source panicking for channel {}",
            channel.id
        );
        self.fetches
            .get(&channel.id)
            .cloned()
            .unwrap_or_else(|| Err(RemoteError::Transient("no fake response".to_string())))
    }
}

/// Idempotent in-memory store keyed by `(channel_id, message_id)`.
#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<HashSet<(i64, i64)>>,
    failing_message_ids: HashSet<i64>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Saves of these message ids fail as if the pool timed out.
    pub(crate) fn failing_on(mut self, message_id: i64) -> Self {
        self.failing_message_ids.insert(message_id);
        self
    }

    pub(crate) fn insert(&self, item: &FetchedItem) -> SaveOutcome {
        let mut rows = self.rows.lock().expect("store lock poisoned");
        if rows.insert((item.channel_id, item.message_id)) {
            SaveOutcome::Inserted
        } else {
            SaveOutcome::AlreadyExists
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().expect("store lock poisoned").len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn save_item(&self, item: &FetchedItem) -> Result<SaveOutcome, DbError> {
        if self.failing_message_ids.contains(&item.message_id) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.insert(item))
    }
}
