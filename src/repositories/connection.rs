//! Connection registry
//!
//! Tenant-aware lookup of storefront connections. The sync pipeline treats
//! the absence of an active connection as a terminal, non-retryable
//! condition for that tenant's job.

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::models::connection::{self, Column, Entity as Connection};

/// Connection status considered usable by the pipeline.
pub const CONNECTION_STATUS_ACTIVE: &str = "active";

/// Registry for per-tenant storefront connections.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    db: Arc<DatabaseConnection>,
}

impl ConnectionRegistry {
    /// Creates a new ConnectionRegistry instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Look up the tenant's active storefront connection, if any.
    pub async fn get_active(&self, tenant_id: Uuid) -> Result<Option<connection::Model>, DbErr> {
        Connection::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Status.eq(CONNECTION_STATUS_ACTIVE))
            .one(self.db.as_ref())
            .await
    }

    /// List every tenant's active storefront connection, oldest first.
    ///
    /// Drives the scheduled fan-out; ordering keeps the stagger deterministic.
    pub async fn list_active(&self) -> Result<Vec<connection::Model>, DbErr> {
        Connection::find()
            .filter(Column::Status.eq(CONNECTION_STATUS_ACTIVE))
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }
}
