//! Periodic removal of expired shares

use common::ShareRegistry;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, info};

/// Start a scheduler that sweeps `registry` on the given cron schedule.
///
/// The returned scheduler keeps running until it is shut down.
pub async fn start_sweeper(
    registry: ShareRegistry,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_, _| {
        let registry = registry.clone();
        Box::pin(async move {
            let removed = registry.sweep().await;
            if removed > 0 {
                info!(removed, "Removed expired shares");
            } else {
                debug!("Sweep found no expired shares");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started share sweeper with schedule: {}", schedule);
    Ok(scheduler)
}
