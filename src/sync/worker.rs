//! Sync worker pool
//!
//! Claims due jobs from the queue each tick and runs them through the
//! orchestrator under a concurrency semaphore, with a per-second
//! fixed-window cap on job starts to keep scheduled fan-out from bursting
//! against the storefront.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::WorkerConfig;
use crate::models::sync_job;
use crate::sync::orchestrator::SyncOrchestrator;
use crate::sync::queue::JobQueue;

/// Fixed-window limiter on job starts per second.
#[derive(Debug)]
pub struct StartLimiter {
    max_per_second: u32,
    state: Mutex<(Instant, u32)>,
}

impl StartLimiter {
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second: max_per_second.max(1),
            state: Mutex::new((Instant::now(), 0)),
        }
    }

    /// Wait until a start slot is available in the current window.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let (window_start, count) = *state;
                let elapsed = window_start.elapsed();

                if elapsed >= Duration::from_secs(1) {
                    *state = (Instant::now(), 1);
                    return;
                }

                if count < self.max_per_second {
                    state.1 = count + 1;
                    return;
                }

                Duration::from_secs(1) - elapsed
            };

            sleep(wait).await;
        }
    }
}

/// Worker pool pulling from the durable queue.
pub struct SyncWorker {
    queue: Arc<JobQueue>,
    orchestrator: Arc<SyncOrchestrator>,
    config: WorkerConfig,
    limiter: Arc<StartLimiter>,
}

impl SyncWorker {
    pub fn new(
        queue: Arc<JobQueue>,
        orchestrator: Arc<SyncOrchestrator>,
        config: WorkerConfig,
    ) -> Self {
        let limiter = Arc::new(StartLimiter::new(config.jobs_per_second));
        Self {
            queue,
            orchestrator,
            config,
            limiter,
        }
    }

    /// Run the worker loop until the shutdown token fires.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            concurrency = self.config.concurrency,
            jobs_per_second = self.config.jobs_per_second,
            tick_ms = self.config.tick_ms,
            "Starting sync worker"
        );

        let tick = Duration::from_millis(self.config.tick_ms);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync worker shutdown requested");
                    break;
                }
                _ = sleep(tick) => {
                    let started = Instant::now();
                    match self.clone().claim_and_run_jobs().await {
                        Ok(count) if count > 0 => {
                            debug!("Executed {} sync jobs", count);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            error!("Error executing sync jobs: {}", err);
                        }
                    }
                    histogram!("sync_worker_tick_duration_ms")
                        .record(started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Sync worker stopped");
    }

    /// Claim due jobs and run them with bounded concurrency.
    #[instrument(skip(self), fields(claim_batch = self.config.claim_batch))]
    pub async fn claim_and_run_jobs(
        self: Arc<Self>,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let jobs = self.queue.claim_due(self.config.claim_batch).await?;
        let count = jobs.len();

        if jobs.is_empty() {
            debug!("No due jobs found to claim");
            return Ok(0);
        }

        debug!("Claimed {} jobs for execution", count);

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(count);

        for job in jobs {
            let worker = self.clone();
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| "Failed to acquire semaphore permit")?;

            worker.limiter.acquire().await;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                worker.run_single_job(job).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        Ok(count)
    }

    /// Run one claimed job and record its outcome on the queue row.
    async fn run_single_job(&self, job: sync_job::Model) {
        let job_type = job.job_type.clone();
        let started = Instant::now();

        let dispatch = tokio::time::timeout(
            Duration::from_secs(self.config.max_run_seconds),
            self.orchestrator.dispatch(&job),
        )
        .await;

        let record = |outcome: &'static str| {
            let labels = vec![
                ("job_type", job_type.clone()),
                ("outcome", outcome.to_string()),
            ];
            counter!("sync_jobs_total", &labels).increment(1);
        };

        let outcome = match dispatch {
            Ok(Ok(())) => {
                record("succeeded");
                self.queue.mark_succeeded(&job).await
            }
            Ok(Err(err)) if err.is_retryable() => {
                record("retried");
                self.queue.fail_with_backoff(&job, &err.to_string()).await
            }
            Ok(Err(err)) => {
                warn!(job_id = %job.id, job_type = %job_type, error = %err, "Job failed permanently");
                record("failed");
                self.queue.mark_failed(&job, &err.to_string()).await
            }
            Err(_) => {
                warn!(job_id = %job.id, job_type = %job_type, "Job timed out");
                record("timed_out");
                self.queue.fail_with_backoff(&job, "job timed out").await
            }
        };

        if let Err(err) = outcome {
            error!(job_id = %job.id, error = %err, "Failed to record job outcome");
        }

        let duration_labels = vec![("job_type", job_type)];
        histogram!("sync_job_duration_ms", &duration_labels)
            .record(started.elapsed().as_secs_f64() * 1_000.0);
    }
}
