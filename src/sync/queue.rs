//! Durable job queue over the sync_jobs table.
//!
//! Enqueue with priority and delay, claim due jobs atomically in priority
//! order, and record outcomes. Transient failures re-enter the queue with
//! exponential backoff and jitter up to a fixed attempt ceiling; permanent
//! failures are terminal.

use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, thread_rng};
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::BackoffConfig;
use crate::models::sync_job::{self, ActiveModel as SyncJobActiveModel, Entity as SyncJobEntity};
use crate::sync::job::JobKind;

/// Transient-failure attempt ceiling before a job is marked failed outright.
pub const MAX_TRANSIENT_ATTEMPTS: i32 = 5;

/// Errors surfaced by queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job payload could not be serialized: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Priority- and delay-aware durable work queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    db: Arc<DatabaseConnection>,
    backoff: BackoffConfig,
}

impl JobQueue {
    /// Create a queue over the given connection pool.
    pub fn new(db: Arc<DatabaseConnection>, backoff: BackoffConfig) -> Self {
        Self { db, backoff }
    }

    /// Enqueue a job, scheduled `delay` from now, at the given priority.
    pub async fn enqueue(
        &self,
        tenant_id: Option<Uuid>,
        kind: &JobKind,
        priority: i16,
        delay: Duration,
    ) -> Result<sync_job::Model, QueueError> {
        let now = Utc::now();
        let scheduled_at = now + chrono::Duration::from_std(delay).unwrap_or_default();
        let payload = serde_json::to_value(kind)?;

        let job = SyncJobActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            job_type: Set(kind.job_type().to_string()),
            status: Set("queued".to_string()),
            priority: Set(priority),
            attempts: Set(0),
            scheduled_at: Set(scheduled_at.fixed_offset()),
            retry_after: Set(None),
            started_at: Set(None),
            finished_at: Set(None),
            payload: Set(payload),
            error: Set(None),
            created_at: Set(now.fixed_offset()),
            updated_at: Set(now.fixed_offset()),
        };

        let model = job.insert(self.db.as_ref()).await?;

        debug!(
            job_id = %model.id,
            job_type = %model.job_type,
            tenant_id = ?tenant_id,
            priority = priority,
            delay_ms = delay.as_millis() as u64,
            "Enqueued sync job"
        );

        Ok(model)
    }

    /// Claim up to `batch` due jobs atomically, transitioning them to
    /// running with the attempt counter bumped.
    pub async fn claim_due(&self, batch: usize) -> Result<Vec<sync_job::Model>, QueueError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let eligible_jobs = SyncJobEntity::find()
            .select_only()
            .column(sync_job::Column::Id)
            .filter(
                sync_job::Column::Status
                    .eq("queued")
                    .and(sync_job::Column::ScheduledAt.lte(now))
                    .and(
                        sync_job::Column::RetryAfter
                            .is_null()
                            .or(sync_job::Column::RetryAfter.lte(now)),
                    ),
            )
            .order_by_desc(sync_job::Column::Priority)
            .order_by_asc(sync_job::Column::ScheduledAt)
            .limit(Some(batch as u64))
            .into_tuple::<Uuid>()
            .all(&txn)
            .await?;

        if eligible_jobs.is_empty() {
            txn.commit().await?;
            return Ok(Vec::new());
        }

        // Claim in a single UPDATE, re-checking status to stay atomic.
        let update_result = SyncJobEntity::update_many()
            .col_expr(sync_job::Column::Status, Expr::value("running"))
            .col_expr(sync_job::Column::StartedAt, Expr::value(now))
            .col_expr(
                sync_job::Column::Attempts,
                Expr::value(Expr::col(sync_job::Column::Attempts).add(1)),
            )
            .filter(sync_job::Column::Id.is_in(eligible_jobs))
            .filter(sync_job::Column::Status.eq("queued"))
            .exec(&txn)
            .await?;

        let claimed_jobs = if update_result.rows_affected > 0 {
            SyncJobEntity::find()
                .filter(sync_job::Column::Status.eq("running"))
                .filter(sync_job::Column::StartedAt.eq(now))
                .order_by_desc(sync_job::Column::Priority)
                .order_by_asc(sync_job::Column::ScheduledAt)
                .all(&txn)
                .await?
        } else {
            Vec::new()
        };

        txn.commit().await?;
        Ok(claimed_jobs)
    }

    /// Mark a claimed job as succeeded.
    pub async fn mark_succeeded(&self, job: &sync_job::Model) -> Result<(), QueueError> {
        let now = Utc::now();
        let mut active: SyncJobActiveModel = job.clone().into();
        active.status = Set("succeeded".to_string());
        active.finished_at = Set(Some(now.fixed_offset()));
        active.updated_at = Set(now.fixed_offset());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    /// Re-queue a transiently failed job with exponential backoff, or mark
    /// it failed once the attempt ceiling is reached.
    pub async fn fail_with_backoff(
        &self,
        job: &sync_job::Model,
        error_msg: &str,
    ) -> Result<(), QueueError> {
        // job.attempts already includes the current attempt (bumped at claim)
        let attempts_completed = job.attempts.max(1);

        if attempts_completed >= MAX_TRANSIENT_ATTEMPTS {
            warn!(
                job_id = %job.id,
                job_type = %job.job_type,
                attempts = attempts_completed,
                "Job exhausted transient retries; marking failed"
            );
            return self.mark_failed(job, error_msg).await;
        }

        let prior_failures = attempts_completed.saturating_sub(1);
        let backoff_seconds = self.calculate_backoff(prior_failures);
        let now = Utc::now();
        let retry_after = now + chrono::Duration::seconds(backoff_seconds as i64);

        let error_details = json!({
            "message": error_msg,
            "attempts": attempts_completed,
            "backoff_seconds": backoff_seconds,
            "timestamp": now.to_rfc3339(),
        });

        let mut active: SyncJobActiveModel = job.clone().into();
        active.status = Set("queued".to_string());
        active.retry_after = Set(Some(retry_after.fixed_offset()));
        active.error = Set(Some(error_details));
        active.updated_at = Set(now.fixed_offset());
        active.update(self.db.as_ref()).await?;

        warn!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = attempts_completed,
            backoff_seconds = backoff_seconds,
            "Job failed transiently, retrying after backoff: {}",
            error_msg
        );

        Ok(())
    }

    /// Mark a job permanently failed.
    pub async fn mark_failed(
        &self,
        job: &sync_job::Model,
        error_msg: &str,
    ) -> Result<(), QueueError> {
        let now = Utc::now();
        let error_details = json!({
            "message": error_msg,
            "attempts": job.attempts,
            "timestamp": now.to_rfc3339(),
        });

        let mut active: SyncJobActiveModel = job.clone().into();
        active.status = Set("failed".to_string());
        active.finished_at = Set(Some(now.fixed_offset()));
        active.error = Set(Some(error_details));
        active.updated_at = Set(now.fixed_offset());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    /// True when a queued or running job of the given type exists.
    ///
    /// Used by the scheduler to keep the interval trigger single-flight.
    pub async fn pending_exists(&self, job_type: &str) -> Result<bool, QueueError> {
        let count = SyncJobEntity::find()
            .filter(sync_job::Column::JobType.eq(job_type))
            .filter(sync_job::Column::Status.is_in(vec!["queued", "running"]))
            .count(self.db.as_ref())
            .await?;

        Ok(count > 0)
    }

    /// Exponential backoff with jitter: base * 2^failures, capped at max.
    fn calculate_backoff(&self, prior_failures: i32) -> f64 {
        let base = self.backoff.base_seconds as f64;
        let max = self.backoff.max_seconds as f64;
        let backoff = (base * 2_f64.powi(prior_failures)).min(max);
        let jitter = if self.backoff.jitter_factor > 0.0 && backoff > 0.0 {
            thread_rng().gen_range(0.0..(self.backoff.jitter_factor * backoff))
        } else {
            0.0
        };
        backoff + jitter
    }
}
