//! Database migrations for the order sync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_02_000001_create_tenants;
mod m2025_06_02_000002_create_connections;
mod m2025_06_02_000003_create_hubs;
mod m2025_06_02_000004_create_customers;
mod m2025_06_02_000005_create_addresses;
mod m2025_06_03_000001_create_seller_details;
mod m2025_06_03_000002_create_packages;
mod m2025_06_03_000003_create_orders;
mod m2025_06_03_000004_create_shipments;
mod m2025_06_03_000005_create_order_items;
mod m2025_06_04_000001_create_sync_jobs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_02_000001_create_tenants::Migration),
            Box::new(m2025_06_02_000002_create_connections::Migration),
            Box::new(m2025_06_02_000003_create_hubs::Migration),
            Box::new(m2025_06_02_000004_create_customers::Migration),
            Box::new(m2025_06_02_000005_create_addresses::Migration),
            Box::new(m2025_06_03_000001_create_seller_details::Migration),
            Box::new(m2025_06_03_000002_create_packages::Migration),
            Box::new(m2025_06_03_000003_create_orders::Migration),
            Box::new(m2025_06_03_000004_create_shipments::Migration),
            Box::new(m2025_06_03_000005_create_order_items::Migration),
            Box::new(m2025_06_04_000001_create_sync_jobs::Migration),
        ]
    }
}
