//! One collection cycle across every configured channel.
//!
//! References are validated in configuration order; validated channels are
//! then collected concurrently, one task each, and all tasks are awaited
//! before the summary is built. A failing or panicking channel never stops
//! its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use tgcollect_core::{ChannelOutcome, ChannelRef, CycleSummary, ResolvedChannel};
use tgcollect_remote::FailureClass;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::channel::{collect_resolved, CollectSettings};
use crate::guard::CycleGuard;
use crate::source::{ChannelSource, ItemStore};

/// Runs one full cycle and returns its summary.
///
/// Never fails: every problem is logged and folded into the summary. When no
/// channel completes the summary has `success == false` and a critical event
/// is logged, but the caller keeps running.
pub async fn run_cycle<S, T>(
    source: Arc<S>,
    store: Arc<T>,
    channels: &[ChannelRef],
    settings: CollectSettings,
) -> CycleSummary
where
    S: ChannelSource + ?Sized + 'static,
    T: ItemStore + ?Sized + 'static,
{
    let cycle_id = Uuid::new_v4();
    tracing::info!(%cycle_id, configured = channels.len(), "collection cycle started");

    let validated = validate_channels(source.as_ref(), channels).await;
    tracing::info!(
        %cycle_id,
        validated = validated.len(),
        configured = channels.len(),
        "channel validation finished"
    );

    let mut tasks = JoinSet::new();
    let mut task_channels = HashMap::with_capacity(validated.len());
    for (reference, channel) in validated {
        let source = Arc::clone(&source);
        let store = Arc::clone(&store);
        let label = reference.to_string();
        let handle = tasks.spawn(async move {
            collect_resolved(source.as_ref(), store.as_ref(), &reference, &channel, settings).await
        });
        task_channels.insert(handle.id(), label);
    }

    let mut summary = CycleSummary::empty(cycle_id);
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, report)) => summary.absorb(report.outcome, report.completed),
            Err(join_err) => {
                let channel = task_channels
                    .get(&join_err.id())
                    .map_or("<unknown>", String::as_str);
                tracing::error!(
                    %cycle_id,
                    channel,
                    panicked = join_err.is_panic(),
                    error = %join_err,
                    "channel task failed"
                );
                summary.absorb(ChannelOutcome::default(), false);
            }
        }
    }

    log_summary(&summary);
    summary
}

/// Resolves every reference in order and keeps the ones that resolved.
///
/// Failures here exclude the channel from this cycle only. A rate limit at
/// validation is not waited out; the channel is simply skipped.
async fn validate_channels<S>(
    source: &S,
    channels: &[ChannelRef],
) -> Vec<(ChannelRef, ResolvedChannel)>
where
    S: ChannelSource + ?Sized,
{
    let mut validated = Vec::with_capacity(channels.len());
    for reference in channels {
        match source.resolve(reference).await {
            Ok(channel) => {
                tracing::debug!(channel = %reference, channel_id = channel.id, "channel validated");
                validated.push((reference.clone(), channel));
            }
            Err(err) => match err.class() {
                FailureClass::PermanentSkip => tracing::error!(
                    channel = %reference,
                    error = %err,
                    "channel reference is invalid; fix the configuration"
                ),
                FailureClass::SkipCycle | FailureClass::RateLimited(_) => tracing::warn!(
                    channel = %reference,
                    error = %err,
                    "channel failed validation; skipping this cycle"
                ),
            },
        }
    }
    validated
}

fn log_summary(summary: &CycleSummary) {
    tracing::info!(
        cycle_id = %summary.cycle_id,
        channels = summary.channels,
        completed = summary.completed,
        processed = summary.processed,
        saved = summary.saved,
        errors = summary.errors,
        success = summary.success,
        "collection cycle finished"
    );
    if !summary.success {
        tracing::error!(
            critical = true,
            cycle_id = %summary.cycle_id,
            "no channel produced data this cycle"
        );
    }
}

/// Everything a scheduler needs to fire cycles: collaborators, the channel
/// list, settings, and the overlap guard.
pub struct CycleRunner<S: ?Sized, T: ?Sized> {
    source: Arc<S>,
    store: Arc<T>,
    channels: Arc<[ChannelRef]>,
    settings: CollectSettings,
    guard: CycleGuard,
}

impl<S: ?Sized, T: ?Sized> Clone for CycleRunner<S, T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            channels: Arc::clone(&self.channels),
            settings: self.settings,
            guard: self.guard.clone(),
        }
    }
}

impl<S, T> CycleRunner<S, T>
where
    S: ChannelSource + ?Sized + 'static,
    T: ItemStore + ?Sized + 'static,
{
    #[must_use]
    pub fn new(
        source: Arc<S>,
        store: Arc<T>,
        channels: Vec<ChannelRef>,
        settings: CollectSettings,
    ) -> Self {
        Self {
            source,
            store,
            channels: channels.into(),
            settings,
            guard: CycleGuard::new(),
        }
    }

    #[must_use]
    pub fn guard(&self) -> &CycleGuard {
        &self.guard
    }

    /// Runs a cycle unless one is already in progress.
    ///
    /// Returns `None` when the trigger was dropped because another cycle
    /// holds the guard.
    pub async fn trigger(&self) -> Option<CycleSummary> {
        let Some(_permit) = self.guard.try_acquire() else {
            tracing::warn!("previous collection cycle still running; trigger dropped");
            return None;
        };
        let summary = run_cycle(
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            &self.channels,
            self.settings,
        )
        .await;
        Some(summary)
    }
}
