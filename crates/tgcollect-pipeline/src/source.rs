//! Seams between the pipeline and its two collaborators.
//!
//! The pipeline only talks to the remote API through [`ChannelSource`] and to
//! the store through [`ItemStore`], so cycles can run against in-memory fakes.

use async_trait::async_trait;
use sqlx::PgPool;
use tgcollect_core::{ChannelRef, FetchedItem, ResolvedChannel, SaveOutcome};
use tgcollect_db::DbError;
use tgcollect_remote::{RemoteClient, RemoteError};

/// Read side: where channel items come from.
///
/// Shared across every channel task of a cycle, so implementations must be
/// `Send + Sync`.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn resolve(&self, reference: &ChannelRef) -> Result<ResolvedChannel, RemoteError>;

    /// Up to `limit` most-recent items, newest first.
    async fn fetch_recent(
        &self,
        channel: &ResolvedChannel,
        limit: u32,
    ) -> Result<Vec<FetchedItem>, RemoteError>;
}

/// Write side: where items go. Saves must be idempotent on
/// `(channel_id, message_id)`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn save_item(&self, item: &FetchedItem) -> Result<SaveOutcome, DbError>;
}

#[async_trait]
impl ChannelSource for RemoteClient {
    async fn resolve(&self, reference: &ChannelRef) -> Result<ResolvedChannel, RemoteError> {
        RemoteClient::resolve(self, reference).await
    }

    async fn fetch_recent(
        &self,
        channel: &ResolvedChannel,
        limit: u32,
    ) -> Result<Vec<FetchedItem>, RemoteError> {
        RemoteClient::fetch_recent(self, channel, limit).await
    }
}

#[async_trait]
impl ItemStore for PgPool {
    async fn save_item(&self, item: &FetchedItem) -> Result<SaveOutcome, DbError> {
        tgcollect_db::save_item(self, item).await
    }
}
