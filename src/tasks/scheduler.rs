use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

pub type MaintenanceCallback = Arc<dyn Fn() + Send + Sync>;

/// Registers the periodic maintenance jobs: each cron tick flushes the
/// judged log to storage and re-syncs the subscribed feeds.
pub async fn configure_maintenance_jobs(
    cron_specs: &[String],
    callback: MaintenanceCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", cron = %cron_label, "maintenance job triggered");
                cb();
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "maintenance job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
