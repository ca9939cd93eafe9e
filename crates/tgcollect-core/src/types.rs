//! Domain types shared by the remote adapter, the persistence gateway, and the
//! collection pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A channel whose reference resolved to a stable numeric identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedChannel {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// One message fetched from a channel, ready to be persisted.
///
/// The natural key is `(channel_id, message_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedItem {
    pub channel_id: i64,
    pub message_id: i64,
    pub published_at: DateTime<Utc>,
    pub text: Option<String>,
    pub views: Option<i32>,
}

/// Result of an upsert-or-ignore write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    AlreadyExists,
}

/// Per-channel counters for a single cycle. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelOutcome {
    pub processed: u32,
    pub saved: u32,
    pub errors: u32,
}

impl ChannelOutcome {
    /// Records one fetched item and how its save went.
    pub fn record(&mut self, saved: bool) {
        self.processed = self.processed.saturating_add(1);
        if saved {
            self.saved = self.saved.saturating_add(1);
        } else {
            self.errors = self.errors.saturating_add(1);
        }
    }
}

/// Aggregate of every channel outcome in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    /// Channels that passed validation and were handed to a collector.
    pub channels: usize,
    /// Channels whose collector reported a completed collection.
    pub completed: usize,
    pub processed: u64,
    pub saved: u64,
    pub errors: u64,
    pub success: bool,
}

impl CycleSummary {
    #[must_use]
    pub fn empty(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            channels: 0,
            completed: 0,
            processed: 0,
            saved: 0,
            errors: 0,
            success: false,
        }
    }

    /// Folds one channel's outcome into the totals.
    pub fn absorb(&mut self, outcome: ChannelOutcome, completed: bool) {
        self.channels += 1;
        self.processed += u64::from(outcome.processed);
        self.saved += u64::from(outcome.saved);
        self.errors += u64::from(outcome.errors);
        if completed {
            self.completed += 1;
            self.success = true;
        }
    }
}
