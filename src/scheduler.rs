//! # Sync Scheduler
//!
//! Fixed-interval background trigger for the sync pipeline: every tick it
//! enqueues one global scheduled-sync job, which the orchestrator fans out
//! into per-tenant sync-orders jobs. A queued-or-running guard keeps the
//! trigger single-flight even when ticks outpace the queue.

use std::sync::Arc;

use metrics::{counter, histogram};
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::SchedulerConfig;
use crate::sync::job::JobKind;
use crate::sync::queue::{JobQueue, QueueError};

/// Background scheduler service.
pub struct SyncScheduler {
    config: SchedulerConfig,
    queue: Arc<JobQueue>,
}

impl SyncScheduler {
    /// Create a new scheduler instance.
    pub fn new(config: SchedulerConfig, queue: Arc<JobQueue>) -> Self {
        Self { config, queue }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            "Starting sync scheduler"
        );
        let tick_interval = TokioDuration::from_secs(self.config.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync scheduler shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Scheduler tick failed");
                    }
                    histogram!("sync_scheduler_tick_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    /// Enqueue one scheduled-sync trigger unless one is already in flight.
    pub async fn tick(&self) -> Result<(), QueueError> {
        let kind = JobKind::ScheduledSync;

        if self.queue.pending_exists(kind.job_type()).await? {
            debug!("Scheduled sync already pending; skipping trigger");
            counter!("sync_scheduler_ticks_skipped_total").increment(1);
            return Ok(());
        }

        let job = self
            .queue
            .enqueue(
                None,
                &kind,
                kind.default_priority(),
                std::time::Duration::ZERO,
            )
            .await?;

        counter!("sync_scheduler_ticks_total").increment(1);
        debug!(job_id = %job.id, "Enqueued scheduled sync trigger");

        Ok(())
    }
}
