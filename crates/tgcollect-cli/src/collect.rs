//! `run` and `once`: wire the remote client and the pool into a cycle runner.

use std::sync::Arc;

use sqlx::PgPool;
use tgcollect_core::AppConfig;
use tgcollect_pipeline::{CollectSettings, CycleRunner};
use tgcollect_remote::RemoteClient;

use crate::{scheduler, shutdown_signal};

pub(crate) type CollectorRunner = CycleRunner<RemoteClient, PgPool>;

/// Run the collector on its interval until Ctrl-C or SIGTERM.
///
/// The first cycle starts immediately; later cycles follow the interval.
/// Cycles in flight at shutdown are abandoned; every save is a single
/// atomic statement, so the store stays consistent.
pub(crate) async fn run_scheduled(config: &AppConfig) -> anyhow::Result<()> {
    let runner = build_runner(config).await?;

    let mut scheduler = scheduler::build_scheduler(runner.clone(), config.collection_interval()).await?;
    tracing::info!(
        channels = config.channels.len(),
        interval_minutes = config.collection_interval_minutes,
        messages_limit = config.messages_limit,
        "collector started"
    );

    let first_cycle = tokio::spawn(async move {
        runner.trigger().await;
    });

    shutdown_signal().await;

    first_cycle.abort();
    scheduler.shutdown().await?;
    tracing::info!("collector stopped");
    Ok(())
}

/// Run exactly one cycle.
///
/// # Errors
///
/// Fails when no channel completed, so scripts and cron wrappers see a
/// non-zero exit.
pub(crate) async fn run_once(config: &AppConfig) -> anyhow::Result<()> {
    let runner = build_runner(config).await?;
    let Some(summary) = runner.trigger().await else {
        anyhow::bail!("a collection cycle is already running");
    };

    println!(
        "cycle {}: channels={} completed={} processed={} saved={} errors={}",
        summary.cycle_id,
        summary.channels,
        summary.completed,
        summary.processed,
        summary.saved,
        summary.errors
    );

    if !summary.success {
        anyhow::bail!("no channel produced data this cycle");
    }
    Ok(())
}

async fn build_runner(config: &AppConfig) -> anyhow::Result<CollectorRunner> {
    let pool = crate::db::prepare_pool(config).await?;
    let client = RemoteClient::from_app_config(config)?;

    Ok(CycleRunner::new(
        Arc::new(client),
        Arc::new(pool),
        config.channels.clone(),
        CollectSettings::from_app_config(config),
    ))
}
