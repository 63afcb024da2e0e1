//! Typed sync job payloads.
//!
//! Every queued unit of work is one variant of [`JobKind`], serialized into
//! the sync_jobs payload column with a `type` tag that doubles as the
//! `job_type` discriminant on the row. The worker dispatches on the decoded
//! variant, so an unknown or malformed payload is a permanent failure, not
//! a typo-prone string comparison.

use serde::{Deserialize, Serialize};

use crate::storefront::{ExternalOrder, OrderFilters};

/// Priority for manual syncs requested through the API.
pub const PRIORITY_MANUAL: i16 = 50;
/// Priority for draining a tenant's failed-orders list.
pub const PRIORITY_RETRY: i16 = 40;
/// Priority for pipeline-internal jobs (page fetch, batches, orders).
pub const PRIORITY_PIPELINE: i16 = 30;
/// Priority for interval-triggered syncs.
pub const PRIORITY_SCHEDULED: i16 = 20;

/// One queued unit of sync work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum JobKind {
    /// Interval trigger: fan out one sync-orders job per connected tenant.
    ScheduledSync,
    /// Caller-requested sync, re-dispatched to sync-orders at high priority.
    ManualSync { filters: OrderFilters },
    /// Fetch one page of orders for a tenant and split it into batches.
    SyncOrders { filters: OrderFilters },
    /// Dedup one batch and fan out per-order jobs.
    SyncOrdersBatch { orders: Vec<ExternalOrder> },
    /// Materialize a single external order.
    ProcessOrder {
        order: ExternalOrder,
        #[serde(default)]
        retry_count: u32,
    },
    /// Drain the tenant's failed-orders list back into process-order jobs.
    RetryFailedOrders,
}

impl JobKind {
    /// Stable job-type string, mirrored into the sync_jobs row for indexing.
    pub fn job_type(&self) -> &'static str {
        match self {
            JobKind::ScheduledSync => "scheduled-sync",
            JobKind::ManualSync { .. } => "manual-sync",
            JobKind::SyncOrders { .. } => "sync-orders",
            JobKind::SyncOrdersBatch { .. } => "sync-orders-batch",
            JobKind::ProcessOrder { .. } => "process-order",
            JobKind::RetryFailedOrders => "retry-failed-orders",
        }
    }

    /// Default scheduling priority for this kind of job.
    pub fn default_priority(&self) -> i16 {
        match self {
            JobKind::ScheduledSync => PRIORITY_SCHEDULED,
            JobKind::ManualSync { .. } => PRIORITY_MANUAL,
            JobKind::SyncOrders { .. } => PRIORITY_PIPELINE,
            JobKind::SyncOrdersBatch { .. } => PRIORITY_PIPELINE,
            JobKind::ProcessOrder { .. } => PRIORITY_PIPELINE,
            JobKind::RetryFailedOrders => PRIORITY_RETRY,
        }
    }

    /// Whether this job carries tenant-scoped work.
    ///
    /// Only the scheduled-sync trigger is global; every other variant must
    /// be enqueued with a tenant id.
    pub fn requires_tenant(&self) -> bool {
        !matches!(self, JobKind::ScheduledSync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_matches_serde_tag() {
        let kinds = [
            JobKind::ScheduledSync,
            JobKind::ManualSync {
                filters: OrderFilters::default(),
            },
            JobKind::SyncOrders {
                filters: OrderFilters::default(),
            },
            JobKind::SyncOrdersBatch { orders: vec![] },
            JobKind::ProcessOrder {
                order: ExternalOrder::default(),
                retry_count: 0,
            },
            JobKind::RetryFailedOrders,
        ];

        for kind in kinds {
            let value = serde_json::to_value(&kind).unwrap();
            assert_eq!(value["type"], kind.job_type());
        }
    }

    #[test]
    fn process_order_retry_count_defaults_to_zero() {
        let value = serde_json::json!({
            "type": "process-order",
            "order": {"id": 42}
        });
        let kind: JobKind = serde_json::from_value(value).unwrap();
        match kind {
            JobKind::ProcessOrder { order, retry_count } => {
                assert_eq!(order.external_id(), Some("42"));
                assert_eq!(retry_count, 0);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_tag_fails_to_decode() {
        let value = serde_json::json!({"type": "definitely-not-a-job"});
        assert!(serde_json::from_value::<JobKind>(value).is_err());
    }

    #[test]
    fn only_scheduled_sync_is_global() {
        assert!(!JobKind::ScheduledSync.requires_tenant());
        assert!(JobKind::RetryFailedOrders.requires_tenant());
        assert!(
            JobKind::ManualSync {
                filters: OrderFilters::default()
            }
            .requires_tenant()
        );
    }

    #[test]
    fn manual_outranks_scheduled() {
        let manual = JobKind::ManualSync {
            filters: OrderFilters::default(),
        };
        assert!(manual.default_priority() > JobKind::ScheduledSync.default_priority());
    }
}
