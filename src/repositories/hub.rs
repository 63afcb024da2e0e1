//! Hub repository
//!
//! Resolves the tenant's primary active fulfillment hub. A missing primary
//! hub is a fatal configuration error for order materialization.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::hub::{self, Column, Entity as Hub};

/// Hub status considered usable for fulfillment.
pub const HUB_STATUS_ACTIVE: &str = "active";

/// Repository for hub lookups.
#[derive(Debug, Clone, Default)]
pub struct HubRepository;

impl HubRepository {
    /// Find the tenant's primary, active hub on the given executor.
    ///
    /// Runs on a caller-supplied executor so the materializer can call it
    /// inside its transaction.
    pub async fn primary_active<C>(
        &self,
        tenant_id: Uuid,
        executor: &C,
    ) -> Result<Option<hub::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Hub::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::IsPrimary.eq(true))
            .filter(Column::Status.eq(HUB_STATUS_ACTIVE))
            .one(executor)
            .await
    }
}
