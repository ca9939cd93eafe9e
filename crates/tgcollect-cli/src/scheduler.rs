//! Interval scheduler for collection cycles.

use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::collect::CollectorRunner;

/// Builds and starts the scheduler with one repeated collection job.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub(crate) async fn build_scheduler(
    runner: CollectorRunner,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_collection_job(&scheduler, runner, interval).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the repeated collection job. Every firing goes through the
/// runner's guard, so a firing that lands while a cycle is still running is
/// dropped.
async fn register_collection_job(
    scheduler: &JobScheduler,
    runner: CollectorRunner,
    interval: Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let runner = runner.clone();

        Box::pin(async move {
            tracing::info!("scheduler: collection trigger fired");
            if runner.trigger().await.is_some() {
                tracing::info!("scheduler: collection cycle complete");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: collection job registered"
    );
    Ok(())
}
