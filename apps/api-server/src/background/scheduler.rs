//! Background publishing runner on top of tokio-cron-scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use pulse_core::services::PublishScheduler;

/// Drives [`PublishScheduler`] ticks at its configured interval.
///
/// A firing that finds the previous tick still running is skipped rather
/// than queued.
pub struct PublishRunner {
    inner: JobScheduler,
    scheduler: Arc<PublishScheduler>,
}

impl PublishRunner {
    /// Register the repeating tick job and start the job scheduler.
    pub async fn start(scheduler: Arc<PublishScheduler>) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        let interval = scheduler.settings().interval();

        let ticker = scheduler.clone();
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let scheduler = ticker.clone();
            Box::pin(async move {
                run_tick(&scheduler).await;
            })
        })?;

        let id = inner.add(job).await?;
        inner.start().await?;
        tracing::info!(
            job_id = %id,
            interval_secs = interval.as_secs(),
            "Publish scheduler started"
        );

        Ok(Self { inner, scheduler })
    }

    /// Stop firing new ticks, then wait for one in flight to finish.
    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        self.scheduler.wait_idle().await;
        tracing::info!("Publish scheduler stopped");
        Ok(())
    }
}

async fn run_tick(scheduler: &PublishScheduler) {
    match scheduler.try_tick().await {
        None => tracing::debug!("Previous tick still running, skipping"),
        Some(Ok(report)) if report.processed() > 0 => tracing::info!(
            processed = report.processed(),
            published = report.published(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Tick finished"
        ),
        Some(Ok(_)) => tracing::debug!("Tick finished, nothing due"),
        Some(Err(e)) => tracing::error!(error = %e, "Tick aborted"),
    }
}
