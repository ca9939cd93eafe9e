//! Collection of a single channel: resolve, fetch, save each item.
//!
//! Nothing here retries. A channel that fails for any reason reports
//! `completed = false` and is tried again on the next cycle.

use std::time::Duration;

use tgcollect_core::{AppConfig, ChannelOutcome, ChannelRef, ResolvedChannel, SaveOutcome};
use tgcollect_remote::{FailureClass, RemoteError};
use tokio::time::Instant;

use crate::source::{ChannelSource, ItemStore};

/// Knobs that shape one channel's collection.
#[derive(Debug, Clone, Copy)]
pub struct CollectSettings {
    pub messages_limit: u32,
    /// Upper bound on a single rate-limit suspension.
    pub max_rate_limit_wait: Duration,
}

impl CollectSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            messages_limit: config.messages_limit,
            max_rate_limit_wait: config.max_rate_limit_wait(),
        }
    }
}

/// What happened to one channel in one cycle.
#[derive(Debug, Clone)]
pub struct ChannelReport {
    pub outcome: ChannelOutcome,
    /// True only when items were fetched and every one was handed to the store.
    pub completed: bool,
    pub elapsed: Duration,
    /// The remote failure that stopped the channel, if any.
    pub failure: Option<RemoteError>,
}

/// Resolves `reference` and then collects it.
///
/// A resolution failure is handled like a fetch failure: logged, and for a
/// rate limit the task waits before reporting.
pub async fn collect_channel<S, T>(
    source: &S,
    store: &T,
    reference: &ChannelRef,
    settings: CollectSettings,
) -> ChannelReport
where
    S: ChannelSource + ?Sized,
    T: ItemStore + ?Sized,
{
    let started = Instant::now();
    match source.resolve(reference).await {
        Ok(channel) => collect_from(source, store, reference, &channel, settings, started).await,
        Err(err) => {
            handle_remote_failure(reference, &err, settings).await;
            finish(reference, None, ChannelOutcome::default(), false, Some(err), started)
        }
    }
}

/// Collects a channel that was already resolved this cycle.
pub async fn collect_resolved<S, T>(
    source: &S,
    store: &T,
    reference: &ChannelRef,
    channel: &ResolvedChannel,
    settings: CollectSettings,
) -> ChannelReport
where
    S: ChannelSource + ?Sized,
    T: ItemStore + ?Sized,
{
    collect_from(source, store, reference, channel, settings, Instant::now()).await
}

async fn collect_from<S, T>(
    source: &S,
    store: &T,
    reference: &ChannelRef,
    channel: &ResolvedChannel,
    settings: CollectSettings,
    started: Instant,
) -> ChannelReport
where
    S: ChannelSource + ?Sized,
    T: ItemStore + ?Sized,
{
    let items = match source.fetch_recent(channel, settings.messages_limit).await {
        Ok(items) => items,
        Err(err) => {
            handle_remote_failure(reference, &err, settings).await;
            return finish(
                reference,
                Some(channel.id),
                ChannelOutcome::default(),
                false,
                Some(err),
                started,
            );
        }
    };

    let mut outcome = ChannelOutcome::default();
    for item in &items {
        match store.save_item(item).await {
            Ok(SaveOutcome::Inserted | SaveOutcome::AlreadyExists) => outcome.record(true),
            Err(e) => {
                tracing::warn!(
                    channel = %reference,
                    channel_id = item.channel_id,
                    message_id = item.message_id,
                    pool_timeout = e.is_pool_timeout(),
                    error = %e,
                    "failed to save item"
                );
                outcome.record(false);
            }
        }
    }

    finish(reference, Some(channel.id), outcome, true, None, started)
}

/// Logs a remote failure according to its class and, for a rate limit,
/// suspends the calling task for the requested time (capped).
async fn handle_remote_failure(reference: &ChannelRef, err: &RemoteError, settings: CollectSettings) {
    match err.class() {
        FailureClass::PermanentSkip => {
            tracing::error!(
                channel = %reference,
                error = %err,
                "channel reference is invalid; fix the configuration"
            );
        }
        FailureClass::SkipCycle => {
            tracing::warn!(channel = %reference, error = %err, "skipping channel this cycle");
        }
        FailureClass::RateLimited(requested) => {
            let wait = requested.min(settings.max_rate_limit_wait);
            tracing::warn!(
                channel = %reference,
                requested_secs = requested.as_secs(),
                wait_secs = wait.as_secs(),
                "rate limited; deferring channel to next cycle"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

fn finish(
    reference: &ChannelRef,
    channel_id: Option<i64>,
    outcome: ChannelOutcome,
    completed: bool,
    failure: Option<RemoteError>,
    started: Instant,
) -> ChannelReport {
    let elapsed = started.elapsed();
    tracing::info!(
        channel = %reference,
        channel_id,
        processed = outcome.processed,
        saved = outcome.saved,
        errors = outcome.errors,
        completed,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "channel collection finished"
    );
    ChannelReport {
        outcome,
        completed,
        elapsed,
        failure,
    }
}
