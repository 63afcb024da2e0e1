//! Migration to create the orders table.
//!
//! The canonical order aggregate. The unique index on
//! (tenant_id, channel, channel_order_id) is the dedup key for externally
//! sourced orders and the final backstop against concurrent duplicate
//! materialization.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Orders::Code).text().not_null())
                    .col(ColumnDef::new(Orders::OrderNumber).text().not_null())
                    .col(
                        ColumnDef::new(Orders::OrderType)
                            .text()
                            .not_null()
                            .default("forward"),
                    )
                    .col(ColumnDef::new(Orders::PaymentMethod).text().not_null())
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::AmountToCollect)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::ApplicableWeight)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Orders::Channel).text().not_null())
                    .col(ColumnDef::new(Orders::ChannelOrderId).text().not_null())
                    .col(
                        ColumnDef::new(Orders::InvoiceDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Orders::HubId).uuid().not_null())
                    .col(ColumnDef::new(Orders::SellerDetailsId).uuid().not_null())
                    .col(ColumnDef::new(Orders::PackageId).uuid().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_tenant_id")
                            .from(Orders::Table, Orders::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_hub_id")
                            .from(Orders::Table, Orders::HubId)
                            .to(Hubs::Table, Hubs::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_seller_details_id")
                            .from(Orders::Table, Orders::SellerDetailsId)
                            .to(SellerDetails::Table, SellerDetails::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_package_id")
                            .from(Orders::Table, Orders::PackageId)
                            .to(Packages::Table, Packages::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The dedup key: at most one local order per (tenant, channel, external id)
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_tenant_channel_order_id")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .col(Orders::Channel)
                    .col(Orders::ChannelOrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_tenant_created")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_tenant_channel_order_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_orders_tenant_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    TenantId,
    Code,
    OrderNumber,
    OrderType,
    PaymentMethod,
    TotalAmount,
    AmountToCollect,
    ApplicableWeight,
    Channel,
    ChannelOrderId,
    InvoiceDate,
    CustomerId,
    HubId,
    SellerDetailsId,
    PackageId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Hubs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SellerDetails {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Packages {
    Table,
    Id,
}
