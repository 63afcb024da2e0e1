//! Customer repository
//!
//! Lookup helpers for the two-step customer resolution the materializer
//! performs: normalized phone first, then email. Creation and updates stay
//! in the materializer's transaction.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::customer::{self, Column, Entity as Customer};

#[derive(Debug, Clone, Default)]
pub struct CustomerRepository;

impl CustomerRepository {
    /// Find a tenant's customer by normalized phone number.
    pub async fn find_by_phone<C>(
        &self,
        tenant_id: Uuid,
        phone: &str,
        executor: &C,
    ) -> Result<Option<customer::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Customer::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Phone.eq(phone))
            .one(executor)
            .await
    }

    /// Find a tenant's customer by email.
    pub async fn find_by_email<C>(
        &self,
        tenant_id: Uuid,
        email: &str,
        executor: &C,
    ) -> Result<Option<customer::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Customer::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Email.eq(email))
            .one(executor)
            .await
    }
}
