//! Migration to create the hubs table.
//!
//! Hubs are a tenant's fulfillment/pickup locations. Order materialization
//! resolves the primary active hub for every new order.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hubs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hubs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Hubs::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Hubs::Name).text().not_null())
                    .col(ColumnDef::new(Hubs::ContactPhone).text().null())
                    .col(ColumnDef::new(Hubs::AddressLine1).text().null())
                    .col(ColumnDef::new(Hubs::AddressLine2).text().null())
                    .col(ColumnDef::new(Hubs::City).text().null())
                    .col(ColumnDef::new(Hubs::State).text().null())
                    .col(ColumnDef::new(Hubs::Pincode).text().null())
                    .col(
                        ColumnDef::new(Hubs::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Hubs::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Hubs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Hubs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hubs_tenant_id")
                            .from(Hubs::Table, Hubs::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hubs_tenant_primary_status")
                    .table(Hubs::Table)
                    .col(Hubs::TenantId)
                    .col(Hubs::IsPrimary)
                    .col(Hubs::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_hubs_tenant_primary_status")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Hubs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Hubs {
    Table,
    Id,
    TenantId,
    Name,
    ContactPhone,
    AddressLine1,
    AddressLine2,
    City,
    State,
    Pincode,
    IsPrimary,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
