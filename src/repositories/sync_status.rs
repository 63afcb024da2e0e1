//! Per-tenant sync status store
//!
//! Fast key-value view of sync progress: the last successful sync timestamp
//! and an append-only list of failed external order payloads awaiting
//! retry. Injected into the orchestrator and handlers so tests can supply
//! their own implementation; the bundled implementation is in-memory.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storefront::ExternalOrder;

/// Per-tenant sync status: last sync time plus parked failed orders.
#[async_trait]
pub trait SyncStatusStore: Send + Sync {
    /// Record the completion time of the tenant's most recent sync.
    async fn set_last_sync(&self, tenant_id: Uuid, at: DateTime<Utc>);

    /// Last recorded sync time, if any.
    async fn last_sync(&self, tenant_id: Uuid) -> Option<DateTime<Utc>>;

    /// Append a failed order payload to the tenant's retry list.
    async fn push_failed_order(&self, tenant_id: Uuid, order: ExternalOrder);

    /// Number of parked failed orders for the tenant.
    async fn failed_orders_count(&self, tenant_id: Uuid) -> usize;

    /// Remove and return every parked failed order for the tenant.
    async fn drain_failed_orders(&self, tenant_id: Uuid) -> Vec<ExternalOrder>;
}

/// In-memory implementation of the sync status store.
#[derive(Debug, Default)]
pub struct InMemorySyncStatusStore {
    last_sync: RwLock<HashMap<Uuid, DateTime<Utc>>>,
    failed_orders: RwLock<HashMap<Uuid, Vec<ExternalOrder>>>,
}

impl InMemorySyncStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStatusStore for InMemorySyncStatusStore {
    async fn set_last_sync(&self, tenant_id: Uuid, at: DateTime<Utc>) {
        self.last_sync.write().await.insert(tenant_id, at);
    }

    async fn last_sync(&self, tenant_id: Uuid) -> Option<DateTime<Utc>> {
        self.last_sync.read().await.get(&tenant_id).copied()
    }

    async fn push_failed_order(&self, tenant_id: Uuid, order: ExternalOrder) {
        self.failed_orders
            .write()
            .await
            .entry(tenant_id)
            .or_default()
            .push(order);
    }

    async fn failed_orders_count(&self, tenant_id: Uuid) -> usize {
        self.failed_orders
            .read()
            .await
            .get(&tenant_id)
            .map(|orders| orders.len())
            .unwrap_or(0)
    }

    async fn drain_failed_orders(&self, tenant_id: Uuid) -> Vec<ExternalOrder> {
        self.failed_orders
            .write()
            .await
            .remove(&tenant_id)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_id(id: &str) -> ExternalOrder {
        ExternalOrder {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn last_sync_round_trip() {
        let store = InMemorySyncStatusStore::new();
        let tenant = Uuid::new_v4();
        assert_eq!(store.last_sync(tenant).await, None);

        let now = Utc::now();
        store.set_last_sync(tenant, now).await;
        assert_eq!(store.last_sync(tenant).await, Some(now));
    }

    #[tokio::test]
    async fn failed_orders_accumulate_and_drain() {
        let store = InMemorySyncStatusStore::new();
        let tenant = Uuid::new_v4();

        store.push_failed_order(tenant, order_with_id("1")).await;
        store.push_failed_order(tenant, order_with_id("2")).await;
        assert_eq!(store.failed_orders_count(tenant).await, 2);

        let drained = store.drain_failed_orders(tenant).await;
        assert_eq!(drained.len(), 2);
        assert_eq!(store.failed_orders_count(tenant).await, 0);
        assert!(store.drain_failed_orders(tenant).await.is_empty());
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let store = InMemorySyncStatusStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.push_failed_order(a, order_with_id("1")).await;
        assert_eq!(store.failed_orders_count(a).await, 1);
        assert_eq!(store.failed_orders_count(b).await, 0);
    }
}
