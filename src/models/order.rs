//! Order entity model
//!
//! The canonical order aggregate created by the materializer. At most one
//! row per (tenant_id, channel, channel_order_id); repeat syncs of the same
//! external id update a restricted subset of fields. Rows are never deleted
//! by the sync pipeline.

use rust_decimal::Decimal;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Human-facing order code
    pub code: String,

    /// Order number as displayed by the sales channel
    pub order_number: String,

    /// Type of order (e.g. forward)
    pub order_type: String,

    /// Payment method (PREPAID|COD)
    pub payment_method: String,

    /// Total order amount
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,

    /// Amount to collect on delivery
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount_to_collect: Decimal,

    /// Billable weight: max(actual weight, volumetric weight), in kilograms
    pub applicable_weight: f64,

    /// Sales channel the order originated from
    pub channel: String,

    /// Identifier of the order on the originating channel (dedup key part)
    pub channel_order_id: String,

    /// Invoice date reported by the channel
    pub invoice_date: Option<DateTimeWithTimeZone>,

    pub customer_id: Uuid,
    pub hub_id: Uuid,
    pub seller_details_id: Uuid,
    pub package_id: Uuid,

    /// Timestamp when the order was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the order was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::hub::Entity",
        from = "Column::HubId",
        to = "super::hub::Column::Id"
    )]
    Hub,
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id"
    )]
    Package,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::shipment::Entity")]
    Shipments,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
