//! Connection entity model
//!
//! This module contains the SeaORM entity model for the connections table,
//! which stores the per-tenant credential record needed to call the
//! storefront API. Rows are created/updated on OAuth completion and deleted
//! on disconnect; this service only reads them.

use super::tenant::Entity as Tenant;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Connection entity representing a tenant's storefront authorization
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    /// Unique identifier for the connection (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Storefront shop identifier (e.g. "acme.example-store.com")
    pub shop_domain: String,

    /// Access token issued by the storefront
    pub access_token: String,

    /// Granted OAuth scopes, comma-separated
    pub scope: Option<String>,

    /// Status of the connection (active|revoked)
    pub status: String,

    /// Timestamp when the storefront authorization completed
    pub connected_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Tenant",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<Tenant> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
