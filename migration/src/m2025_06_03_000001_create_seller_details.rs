//! Migration to create the seller_details table.
//!
//! Immutable snapshot of the seller's hub at materialization time. Sellers
//! can change their hub later; historical orders must not change with them,
//! so rows here are written once and never updated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SellerDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SellerDetails::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SellerDetails::TenantId).uuid().not_null())
                    .col(ColumnDef::new(SellerDetails::SellerName).text().not_null())
                    .col(ColumnDef::new(SellerDetails::ContactPhone).text().null())
                    .col(ColumnDef::new(SellerDetails::Line1).text().null())
                    .col(ColumnDef::new(SellerDetails::Line2).text().null())
                    .col(ColumnDef::new(SellerDetails::City).text().null())
                    .col(ColumnDef::new(SellerDetails::State).text().null())
                    .col(ColumnDef::new(SellerDetails::Pincode).text().null())
                    .col(
                        ColumnDef::new(SellerDetails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seller_details_tenant_id")
                            .from(SellerDetails::Table, SellerDetails::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SellerDetails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SellerDetails {
    Table,
    Id,
    TenantId,
    SellerName,
    ContactPhone,
    Line1,
    Line2,
    City,
    State,
    Pincode,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
