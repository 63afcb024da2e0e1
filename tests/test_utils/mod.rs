//! Shared helpers for integration tests: in-memory database setup, row
//! seeding, sample payloads, and storefront/status doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tokio::sync::Mutex;
use uuid::Uuid;

use migration::{Migrator, MigratorTrait};
use ordersync::config::{SchedulerConfig, SyncConfig};
use ordersync::models::{connection, hub, tenant};
use ordersync::storefront::{
    ExternalOrder, OrderFilters, StorefrontClient, StorefrontError,
    types::{ExternalAddress, ExternalCustomer, ExternalLineItem},
};

/// Fresh in-memory database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("create in-memory database");
    Migrator::up(&db, None).await.expect("apply migrations");
    db
}

pub async fn seed_tenant(db: &DatabaseConnection, name: &str) -> Uuid {
    let now = Utc::now().fixed_offset();
    let model = tenant::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(Some(name.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert tenant");
    model.id
}

pub async fn seed_connection(db: &DatabaseConnection, tenant_id: Uuid) -> connection::Model {
    let now = Utc::now().fixed_offset();
    connection::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        shop_domain: Set(format!("shop-{}.example-store.com", &tenant_id.simple())),
        access_token: Set("test-token".to_string()),
        scope: Set(Some("read_orders".to_string())),
        status: Set("active".to_string()),
        connected_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert connection")
}

pub async fn seed_hub(db: &DatabaseConnection, tenant_id: Uuid, is_primary: bool) -> hub::Model {
    let now = Utc::now().fixed_offset();
    hub::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        name: Set("Main Warehouse".to_string()),
        contact_phone: Set(Some("9876543210".to_string())),
        address_line1: Set(Some("Plot 4, Industrial Area".to_string())),
        address_line2: Set(None),
        city: Set(Some("Bengaluru".to_string())),
        state: Set(Some("KA".to_string())),
        pincode: Set(Some("560100".to_string())),
        is_primary: Set(is_primary),
        status: Set("active".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert hub")
}

/// The §-style reference order: pending, 500.00 total, one two-unit item.
pub fn sample_order(id: i64) -> ExternalOrder {
    ExternalOrder {
        id: Some(id.to_string()),
        name: Some(format!("#{}", 1000 + id)),
        order_number: Some(1000 + id),
        financial_status: Some("pending".to_string()),
        currency: Some("INR".to_string()),
        total_price: Some("500.00".to_string()),
        total_outstanding: Some("500.00".to_string()),
        total_weight: Some(400),
        created_at: Some(Utc::now()),
        email: Some("jane@example.com".to_string()),
        customer: Some(ExternalCustomer {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: Some("+91 98765 43210".to_string()),
        }),
        shipping_address: Some(ExternalAddress {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            address1: Some("12 Hill Road".to_string()),
            address2: None,
            city: Some("Mumbai".to_string()),
            province: Some("MH".to_string()),
            country: Some("India".to_string()),
            zip: Some("400050".to_string()),
            phone: Some("+91 98765 43210".to_string()),
        }),
        line_items: vec![ExternalLineItem {
            id: Some(format!("li-{}", id)),
            name: Some("Widget".to_string()),
            sku: Some("WDG-1".to_string()),
            quantity: 2,
            price: Some("250.00".to_string()),
            grams: Some(200),
        }],
        ..Default::default()
    }
}

/// Sync config tuned for tests: no deliberate pauses.
pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        fan_out_pause_ms: 0,
        batch_enqueue_delay_ms: 0,
        retry_base_seconds: 60,
        ..SyncConfig::default()
    }
}

/// Scheduler config tuned for tests: no stagger.
pub fn test_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        stagger_ms: 0,
        ..SchedulerConfig::default()
    }
}

/// Storefront double that serves scripted pages in order.
pub struct StubStorefront {
    pages: Mutex<VecDeque<Result<Vec<ExternalOrder>, StorefrontError>>>,
    pub seen_filters: Mutex<Vec<OrderFilters>>,
}

impl StubStorefront {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            seen_filters: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(orders: Vec<ExternalOrder>) -> Arc<Self> {
        let stub = Self::new();
        stub.pages.try_lock().unwrap().push_back(Ok(orders));
        Arc::new(stub)
    }

    pub async fn push_page(&self, page: Result<Vec<ExternalOrder>, StorefrontError>) {
        self.pages.lock().await.push_back(page);
    }
}

#[async_trait]
impl StorefrontClient for StubStorefront {
    async fn fetch_orders(
        &self,
        _connection: &connection::Model,
        filters: &OrderFilters,
    ) -> Result<Vec<ExternalOrder>, StorefrontError> {
        self.seen_filters.lock().await.push(filters.clone());
        self.pages
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
