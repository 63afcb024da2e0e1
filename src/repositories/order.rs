//! Order repository and dedup index
//!
//! Bulk existence filtering over the (tenant, channel, channel_order_id)
//! dedup key, plus the single-order lookup the materializer uses for its
//! create-or-update decision. The bulk path issues exactly one query per
//! batch, never one per id.

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use crate::models::order::{self, Column, Entity as Order};

/// Repository for local order lookups keyed by the dedup key.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    /// Creates a new OrderRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Return the subset of `external_ids` NOT already materialized for the
    /// tenant/channel, via a single bulk existence query.
    ///
    /// Called once per batch immediately before per-order enqueue; the
    /// storage unique index remains the final backstop for ids that slip
    /// through between this check and the insert.
    pub async fn filter_new(
        &self,
        tenant_id: Uuid,
        channel: &str,
        external_ids: &[String],
    ) -> Result<HashSet<String>, DbErr> {
        if external_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let existing: HashSet<String> = Order::find()
            .select_only()
            .column(Column::ChannelOrderId)
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Channel.eq(channel))
            .filter(Column::ChannelOrderId.is_in(external_ids.iter().cloned()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .collect();

        Ok(external_ids
            .iter()
            .filter(|id| !existing.contains(*id))
            .cloned()
            .collect())
    }

    /// Find a materialized order by its dedup key on the given executor.
    pub async fn find_by_channel_order_id<C>(
        &self,
        tenant_id: Uuid,
        channel: &str,
        channel_order_id: &str,
        executor: &C,
    ) -> Result<Option<order::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Order::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Channel.eq(channel))
            .filter(Column::ChannelOrderId.eq(channel_order_id))
            .one(executor)
            .await
    }
}
