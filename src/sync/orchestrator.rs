//! Sync orchestrator
//!
//! One handler per job variant: the scheduled fan-out across tenants, the
//! manual re-dispatch, the page fetch and batch split, the authoritative
//! batch dedup with bounded per-order fan-out, single-order materialization
//! with its retry ceiling, and the failed-orders drain. All collaborators
//! (queue, storefront client, status store) are injected so tests can
//! substitute doubles.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{SchedulerConfig, SyncConfig};
use crate::models::{CHANNEL_STOREFRONT, sync_job};
use crate::repositories::{ConnectionRegistry, OrderRepository, SyncStatusStore};
use crate::storefront::{ExternalOrder, OrderFilters, StorefrontClient, StorefrontError};
use crate::sync::job::{JobKind, PRIORITY_MANUAL, PRIORITY_RETRY, PRIORITY_SCHEDULED};
use crate::sync::materializer::{MaterializeAction, MaterializeError, OrderMaterializer};
use crate::sync::queue::{JobQueue, QueueError};

/// Per-batch result counts; synced + skipped + errors equals the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Orders handed off to process-order jobs
    pub synced: usize,
    /// Orders already materialized (or duplicated within the batch)
    pub skipped: usize,
    /// Orders that could not be enqueued or carried no id
    pub errors: usize,
}

/// Errors surfaced by job dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("job payload could not be decoded: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("job is missing its tenant id")]
    MissingTenant,
    #[error("tenant has no active storefront connection")]
    MissingConnection,
    #[error(transparent)]
    Storefront(#[from] StorefrontError),
    #[error("order failed permanently: {0}")]
    Materialize(#[source] MaterializeError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl DispatchError {
    /// Whether the failing job should re-enter the queue with backoff.
    ///
    /// Configuration problems (missing tenant/connection, undecodable
    /// payload) and orders that already exhausted their own retry ceiling
    /// are permanent; storefront and storage hiccups are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Payload(_)
            | DispatchError::MissingTenant
            | DispatchError::MissingConnection
            | DispatchError::Materialize(_) => false,
            DispatchError::Storefront(err) => err.is_retryable(),
            DispatchError::Queue(_) | DispatchError::Database(_) => true,
        }
    }
}

/// Job-queue driven state machine tying the sync pipeline together.
pub struct SyncOrchestrator {
    queue: Arc<JobQueue>,
    registry: ConnectionRegistry,
    orders: OrderRepository,
    storefront: Arc<dyn StorefrontClient>,
    materializer: OrderMaterializer,
    status: Arc<dyn SyncStatusStore>,
    sync: SyncConfig,
    scheduler: SchedulerConfig,
}

impl SyncOrchestrator {
    /// Build an orchestrator with explicit collaborators.
    pub fn new(
        db: Arc<DatabaseConnection>,
        queue: Arc<JobQueue>,
        storefront: Arc<dyn StorefrontClient>,
        status: Arc<dyn SyncStatusStore>,
        sync: SyncConfig,
        scheduler: SchedulerConfig,
    ) -> Self {
        let materializer = OrderMaterializer::new(
            db.clone(),
            Duration::from_secs(sync.transaction_timeout_seconds),
        );

        Self {
            queue,
            registry: ConnectionRegistry::new(db.clone()),
            orders: OrderRepository::new(db),
            storefront,
            materializer,
            status,
            sync,
            scheduler,
        }
    }

    /// Decode and execute one claimed job.
    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type))]
    pub async fn dispatch(&self, job: &sync_job::Model) -> Result<(), DispatchError> {
        let kind: JobKind = serde_json::from_value(job.payload.clone())?;

        if kind.requires_tenant() && job.tenant_id.is_none() {
            return Err(DispatchError::MissingTenant);
        }

        match kind {
            JobKind::ScheduledSync => self.run_scheduled_sync().await,
            JobKind::ManualSync { filters } => {
                self.run_manual_sync(job.tenant_id.unwrap(), filters).await
            }
            JobKind::SyncOrders { filters } => {
                self.run_sync_orders(job.tenant_id.unwrap(), filters, job.priority)
                    .await
            }
            JobKind::SyncOrdersBatch { orders } => self
                .run_batch(job.tenant_id.unwrap(), orders, job.priority)
                .await
                .map(|_| ()),
            JobKind::ProcessOrder { order, retry_count } => {
                self.run_process_order(job.tenant_id.unwrap(), order, retry_count, job.priority)
                    .await
            }
            JobKind::RetryFailedOrders => self.run_retry_failed(job.tenant_id.unwrap()).await,
        }
    }

    /// Fan out one sync-orders job per tenant with an active connection,
    /// windowed to the recent past, with a stagger between enqueues.
    async fn run_scheduled_sync(&self) -> Result<(), DispatchError> {
        let connections = self.registry.list_active().await?;
        let now = Utc::now();
        let total = connections.len();

        for (index, connection) in connections.into_iter().enumerate() {
            let mut filters = OrderFilters::last_hours(now, self.scheduler.window_hours);
            filters.limit = Some(self.sync.page_size);

            self.queue
                .enqueue(
                    Some(connection.tenant_id),
                    &JobKind::SyncOrders { filters },
                    PRIORITY_SCHEDULED,
                    Duration::ZERO,
                )
                .await?;

            counter!("sync_scheduled_fanout_total").increment(1);

            if index + 1 < total {
                sleep(Duration::from_millis(self.scheduler.stagger_ms)).await;
            }
        }

        info!(tenants = total, "Scheduled sync fan-out completed");
        Ok(())
    }

    /// Re-dispatch a caller-requested sync at manual priority.
    async fn run_manual_sync(
        &self,
        tenant_id: Uuid,
        filters: OrderFilters,
    ) -> Result<(), DispatchError> {
        self.queue
            .enqueue(
                Some(tenant_id),
                &JobKind::SyncOrders { filters },
                PRIORITY_MANUAL,
                Duration::ZERO,
            )
            .await?;
        Ok(())
    }

    /// Fetch one page of orders and split it into batch jobs.
    async fn run_sync_orders(
        &self,
        tenant_id: Uuid,
        mut filters: OrderFilters,
        priority: i16,
    ) -> Result<(), DispatchError> {
        let connection = self
            .registry
            .get_active(tenant_id)
            .await?
            .ok_or(DispatchError::MissingConnection)?;

        let now = Utc::now();
        if !filters.has_date_bounds() {
            let default_window = OrderFilters::last_days(now, self.sync.default_window_days);
            filters.created_at_min = default_window.created_at_min;
        }
        filters.limit = Some(
            filters
                .limit
                .unwrap_or(self.sync.page_size)
                .min(self.sync.page_size),
        );

        let page = self.storefront.fetch_orders(&connection, &filters).await?;
        let page_size = page.len();

        // Duplicates within the page collapse first-write-wins before
        // batching; the authoritative dedup happens at batch level.
        let deduped = collapse_duplicate_ids(page);
        let batches = chunk_orders(deduped, self.sync.batch_size);
        let batch_count = batches.len();

        for (index, orders) in batches.into_iter().enumerate() {
            self.queue
                .enqueue(
                    Some(tenant_id),
                    &JobKind::SyncOrdersBatch { orders },
                    priority,
                    Duration::ZERO,
                )
                .await?;

            if index + 1 < batch_count {
                sleep(Duration::from_millis(self.sync.batch_enqueue_delay_ms)).await;
            }
        }

        self.status.set_last_sync(tenant_id, now).await;

        counter!("sync_pages_fetched_total").increment(1);
        info!(
            tenant_id = %tenant_id,
            fetched = page_size,
            batches = batch_count,
            "Fetched storefront page and enqueued batches"
        );

        Ok(())
    }

    /// Authoritative dedup for one batch, then a bounded fan-out of
    /// process-order jobs. Errors in one order never abort its siblings.
    pub async fn run_batch(
        &self,
        tenant_id: Uuid,
        orders: Vec<ExternalOrder>,
        priority: i16,
    ) -> Result<BatchOutcome, DispatchError> {
        let total = orders.len();
        let mut outcome = BatchOutcome::default();

        let mut with_ids = Vec::with_capacity(total);
        for order in orders {
            match order.external_id() {
                Some(id) => with_ids.push((id.to_string(), order)),
                None => {
                    warn!(tenant_id = %tenant_id, "Dropping external order without id");
                    outcome.errors += 1;
                }
            }
        }

        let ids: Vec<String> = with_ids.iter().map(|(id, _)| id.clone()).collect();
        let new_ids = self
            .orders
            .filter_new(tenant_id, CHANNEL_STOREFRONT, &ids)
            .await?;

        let mut seen = HashSet::new();
        let mut survivors = Vec::new();
        for (id, order) in with_ids {
            if new_ids.contains(&id) && seen.insert(id) {
                survivors.push(order);
            } else {
                outcome.skipped += 1;
            }
        }

        let groups: Vec<&[ExternalOrder]> =
            survivors.chunks(self.sync.order_concurrency.max(1)).collect();
        let group_count = groups.len();

        for (index, group) in groups.into_iter().enumerate() {
            let mut tasks = tokio::task::JoinSet::new();
            for order in group {
                let queue = self.queue.clone();
                let kind = JobKind::ProcessOrder {
                    order: order.clone(),
                    retry_count: 0,
                };
                tasks.spawn(async move {
                    queue
                        .enqueue(Some(tenant_id), &kind, priority, Duration::ZERO)
                        .await
                });
            }

            while let Some(result) = tasks.join_next().await {
                match result {
                    Ok(Ok(_)) => outcome.synced += 1,
                    Ok(Err(err)) => {
                        warn!(tenant_id = %tenant_id, error = %err, "Failed to enqueue order job");
                        outcome.errors += 1;
                    }
                    Err(err) => {
                        warn!(tenant_id = %tenant_id, error = %err, "Order enqueue task panicked");
                        outcome.errors += 1;
                    }
                }
            }

            if index + 1 < group_count {
                sleep(Duration::from_millis(self.sync.fan_out_pause_ms)).await;
            }
        }

        counter!("sync_batch_orders_synced_total").increment(outcome.synced as u64);
        counter!("sync_batch_orders_skipped_total").increment(outcome.skipped as u64);
        counter!("sync_batch_orders_errored_total").increment(outcome.errors as u64);

        info!(
            tenant_id = %tenant_id,
            total = total,
            synced = outcome.synced,
            skipped = outcome.skipped,
            errors = outcome.errors,
            "Batch processed"
        );

        Ok(outcome)
    }

    /// Materialize a single order, retrying with a growing delay up to the
    /// attempt ceiling, after which the payload is parked in the tenant's
    /// failed-orders list.
    async fn run_process_order(
        &self,
        tenant_id: Uuid,
        order: ExternalOrder,
        retry_count: u32,
        priority: i16,
    ) -> Result<(), DispatchError> {
        // A disconnect invalidates in-flight work for the tenant outright.
        let connection = self
            .registry
            .get_active(tenant_id)
            .await?
            .ok_or(DispatchError::MissingConnection)?;

        match self
            .materializer
            .materialize(&order, tenant_id, &connection.shop_domain)
            .await
        {
            Ok(outcome) => {
                let action = match outcome.action {
                    MaterializeAction::Created => "created",
                    MaterializeAction::Updated => "updated",
                    MaterializeAction::Skipped => "skipped",
                };
                let labels = vec![("action", action.to_string())];
                counter!("sync_orders_materialized_total", &labels).increment(1);
                debug!(
                    tenant_id = %tenant_id,
                    channel_order_id = ?order.external_id(),
                    action = action,
                    "Order processed"
                );
                Ok(())
            }
            Err(err) => {
                let next_retry = retry_count + 1;

                if err.is_retryable() && next_retry < self.sync.max_order_attempts {
                    let delay =
                        Duration::from_secs(self.sync.retry_base_seconds * next_retry as u64);

                    warn!(
                        tenant_id = %tenant_id,
                        channel_order_id = ?order.external_id(),
                        retry_count = next_retry,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Order materialization failed; scheduling retry"
                    );

                    self.queue
                        .enqueue(
                            Some(tenant_id),
                            &JobKind::ProcessOrder {
                                order,
                                retry_count: next_retry,
                            },
                            priority,
                            delay,
                        )
                        .await?;

                    counter!("sync_order_retries_total").increment(1);
                    Ok(())
                } else {
                    warn!(
                        tenant_id = %tenant_id,
                        channel_order_id = ?order.external_id(),
                        retry_count = retry_count,
                        error = %err,
                        "Order failed permanently; parking for manual retry"
                    );

                    self.status.push_failed_order(tenant_id, order).await;
                    counter!("sync_orders_parked_total").increment(1);
                    Err(DispatchError::Materialize(err))
                }
            }
        }
    }

    /// Drain the tenant's failed-orders list back into fresh process-order
    /// jobs with their retry counts reset.
    async fn run_retry_failed(&self, tenant_id: Uuid) -> Result<(), DispatchError> {
        let parked = self.status.drain_failed_orders(tenant_id).await;
        let total = parked.len();
        let mut requeued = 0usize;

        for order in parked {
            let kind = JobKind::ProcessOrder {
                order: order.clone(),
                retry_count: 0,
            };
            match self
                .queue
                .enqueue(Some(tenant_id), &kind, PRIORITY_RETRY, Duration::ZERO)
                .await
            {
                Ok(_) => requeued += 1,
                Err(err) => {
                    // Keep the payload parked rather than dropping it.
                    warn!(tenant_id = %tenant_id, error = %err, "Failed to requeue parked order");
                    self.status.push_failed_order(tenant_id, order).await;
                }
            }
        }

        info!(
            tenant_id = %tenant_id,
            parked = total,
            requeued = requeued,
            "Drained failed-orders list"
        );

        Ok(())
    }
}

/// Split a page of orders into fixed-size batches, preserving order.
pub fn chunk_orders(orders: Vec<ExternalOrder>, batch_size: usize) -> Vec<Vec<ExternalOrder>> {
    if orders.is_empty() {
        return Vec::new();
    }

    orders
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Collapse duplicate external ids within one page, first occurrence wins.
/// Orders without an id pass through for the batch stage to count.
fn collapse_duplicate_ids(orders: Vec<ExternalOrder>) -> Vec<ExternalOrder> {
    let mut seen = HashSet::new();
    orders
        .into_iter()
        .filter(|order| match order.external_id() {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect()
}
