//! Order materializer
//!
//! Transactionally converts one external order payload into the local
//! entity graph: customer, address, package, seller snapshot, order,
//! shipment, and order items. Repeat syncs of the same external id take the
//! update path, which touches only the fields that legitimately change on a
//! re-sync. Everything happens inside a single bounded transaction; a
//! duplicate-key race on the orders unique index is reported as a Skip.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::models::{
    CHANNEL_STOREFRONT, SHIPMENT_STATUS_NEW, address, customer, order, order_item, package,
    seller_details, shipment,
};
use crate::repositories::{CustomerRepository, HubRepository, OrderRepository};
use crate::storefront::ExternalOrder;
use crate::sync::{contact, dimensions, payment};

/// What the materializer did with one external order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeAction {
    Created,
    Updated,
    /// Lost a dedup race; another attempt materialized the order first.
    Skipped,
}

/// Result of materializing one external order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeOutcome {
    pub action: MaterializeAction,
    /// Absent only when a duplicate-key race was skipped.
    pub order_id: Option<Uuid>,
}

/// Errors surfaced by materialization.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("tenant has no primary active hub")]
    MissingHub,
    #[error("external order payload has no id")]
    MissingExternalId,
    #[error("materialization timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl MaterializeError {
    /// Configuration errors are fatal for the order; timeouts and storage
    /// errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            MaterializeError::MissingHub | MaterializeError::MissingExternalId => false,
            MaterializeError::Timeout { .. } | MaterializeError::Database(_) => true,
        }
    }
}

/// Transactional converter from external payloads to the local order graph.
#[derive(Debug, Clone)]
pub struct OrderMaterializer {
    db: Arc<DatabaseConnection>,
    orders: OrderRepository,
    customers: CustomerRepository,
    hubs: HubRepository,
    txn_timeout: Duration,
}

impl OrderMaterializer {
    pub fn new(db: Arc<DatabaseConnection>, txn_timeout: Duration) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            customers: CustomerRepository,
            hubs: HubRepository,
            db,
            txn_timeout,
        }
    }

    /// Materialize one external order for the tenant, creating or updating
    /// the local order graph.
    pub async fn materialize(
        &self,
        external: &ExternalOrder,
        tenant_id: Uuid,
        shop_domain: &str,
    ) -> Result<MaterializeOutcome, MaterializeError> {
        let external_id = external
            .external_id()
            .ok_or(MaterializeError::MissingExternalId)?
            .to_string();

        match timeout(
            self.txn_timeout,
            self.materialize_in_txn(external, tenant_id, shop_domain, &external_id),
        )
        .await
        {
            Ok(outcome) => outcome,
            // The dropped transaction rolls back on its own.
            Err(_) => Err(MaterializeError::Timeout {
                seconds: self.txn_timeout.as_secs(),
            }),
        }
    }

    async fn materialize_in_txn(
        &self,
        external: &ExternalOrder,
        tenant_id: Uuid,
        shop_domain: &str,
        external_id: &str,
    ) -> Result<MaterializeOutcome, MaterializeError> {
        let txn = self.db.begin().await?;

        let existing = self
            .orders
            .find_by_channel_order_id(tenant_id, CHANNEL_STOREFRONT, external_id, &txn)
            .await?;

        let outcome = match existing {
            Some(order) => self.apply_update(&txn, external, order).await,
            None => {
                self.create_graph(&txn, external, tenant_id, shop_domain, external_id)
                    .await
            }
        };

        match outcome {
            Ok(outcome) => {
                txn.commit().await?;
                Ok(outcome)
            }
            Err(MaterializeError::Database(err)) if is_unique_violation(&err) => {
                // Concurrent attempt won the race on the dedup index.
                let _ = txn.rollback().await;
                debug!(
                    tenant_id = %tenant_id,
                    channel_order_id = %external_id,
                    "Duplicate order detected during create; treating as skip"
                );
                Ok(MaterializeOutcome {
                    action: MaterializeAction::Skipped,
                    order_id: None,
                })
            }
            Err(err) => {
                let _ = txn.rollback().await;
                Err(err)
            }
        }
    }

    /// Create path: the full entity graph in one transaction.
    async fn create_graph(
        &self,
        txn: &DatabaseTransaction,
        external: &ExternalOrder,
        tenant_id: Uuid,
        shop_domain: &str,
        external_id: &str,
    ) -> Result<MaterializeOutcome, MaterializeError> {
        let now = Utc::now().fixed_offset();

        let hub = self
            .hubs
            .primary_active(tenant_id, txn)
            .await?
            .ok_or(MaterializeError::MissingHub)?;

        let customer = self.resolve_customer(txn, external, tenant_id, now).await?;
        self.upsert_address(txn, external, customer.id, now).await?;

        let attrs = dimensions::compute_package(external);
        let package_row = package::ActiveModel {
            id: Set(Uuid::new_v4()),
            actual_weight: Set(attrs.actual_weight),
            length_cm: Set(attrs.length_cm),
            width_cm: Set(attrs.width_cm),
            height_cm: Set(attrs.height_cm),
            volumetric_weight: Set(attrs.volumetric_weight),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        let seller_row = seller_details::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            seller_name: Set(shop_domain.to_string()),
            contact_phone: Set(hub.contact_phone.clone()),
            line1: Set(hub.address_line1.clone()),
            line2: Set(hub.address_line2.clone()),
            city: Set(hub.city.clone()),
            state: Set(hub.state.clone()),
            pincode: Set(hub.pincode.clone()),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        let method = payment::derive_payment_method(external.financial_status.as_deref());
        let to_collect = payment::amount_to_collect(external);

        let order_number = external
            .name
            .clone()
            .or_else(|| external.order_number.map(|n| n.to_string()))
            .unwrap_or_else(|| external_id.to_string());

        let order_row = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            code: Set(generate_order_code()),
            order_number: Set(order_number),
            order_type: Set("forward".to_string()),
            payment_method: Set(method.as_str().to_string()),
            total_amount: Set(external.total_price_decimal()),
            amount_to_collect: Set(to_collect),
            applicable_weight: Set(attrs.applicable_weight),
            channel: Set(CHANNEL_STOREFRONT.to_string()),
            channel_order_id: Set(external_id.to_string()),
            invoice_date: Set(external
                .processed_at
                .or(external.created_at)
                .map(|dt| dt.fixed_offset())),
            customer_id: Set(customer.id),
            hub_id: Set(hub.id),
            seller_details_id: Set(seller_row.id),
            package_id: Set(package_row.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        shipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_row.id),
            status: Set(SHIPMENT_STATUS_NEW.to_string()),
            tracking_events: Set(Some(json!([{
                "status": SHIPMENT_STATUS_NEW,
                "description": "Order Created",
                "timestamp": now.to_rfc3339(),
            }]))),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        for item in &external.line_items {
            let weight = dimensions::grams_to_kg(item.grams.unwrap_or(0));
            let edge = dimensions::item_edge_from_weight_cm(weight);

            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_row.id),
                name: Set(item.name.clone().unwrap_or_else(|| "Item".to_string())),
                sku: Set(item.sku.clone()),
                units: Set(item.quantity.max(1) as i32),
                unit_price: Set(item.price_decimal()),
                hsn_code: Set("0".to_string()),
                tax_rate: Set(Decimal::ZERO),
                weight: Set(weight),
                length_cm: Set(edge),
                width_cm: Set(edge),
                height_cm: Set(edge),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
        }

        info!(
            tenant_id = %tenant_id,
            order_id = %order_row.id,
            channel_order_id = %external_id,
            payment_method = method.as_str(),
            items = external.line_items.len(),
            "Materialized external order"
        );

        Ok(MaterializeOutcome {
            action: MaterializeAction::Created,
            order_id: Some(order_row.id),
        })
    }

    /// Update path: only the fields that legitimately change on a re-sync.
    /// Line items are intentionally left untouched.
    async fn apply_update(
        &self,
        txn: &DatabaseTransaction,
        external: &ExternalOrder,
        existing: order::Model,
    ) -> Result<MaterializeOutcome, MaterializeError> {
        let now = Utc::now().fixed_offset();

        let method = payment::derive_payment_method(external.financial_status.as_deref());
        let to_collect = payment::amount_to_collect(external);

        let order_id = existing.id;
        let customer_id = existing.customer_id;

        let mut active: order::ActiveModel = existing.into();
        active.total_amount = Set(external.total_price_decimal());
        active.payment_method = Set(method.as_str().to_string());
        active.amount_to_collect = Set(to_collect);
        if let Some(invoice) = external.processed_at.or(external.created_at) {
            active.invoice_date = Set(Some(invoice.fixed_offset()));
        }
        active.updated_at = Set(now);
        active.update(txn).await?;

        if let Some(customer) = customer::Entity::find_by_id(customer_id).one(txn).await? {
            let refreshed = self
                .refresh_customer_contact(txn, external, customer, now)
                .await?;
            self.upsert_address(txn, external, refreshed.id, now).await?;
        }

        info!(
            order_id = %order_id,
            payment_method = method.as_str(),
            "Updated previously materialized order"
        );

        Ok(MaterializeOutcome {
            action: MaterializeAction::Updated,
            order_id: Some(order_id),
        })
    }

    /// Two-lookup-then-upsert customer resolution: normalized phone first,
    /// then email, then create.
    async fn resolve_customer(
        &self,
        txn: &DatabaseTransaction,
        external: &ExternalOrder,
        tenant_id: Uuid,
        now: DateTimeWithTimeZone,
    ) -> Result<customer::Model, MaterializeError> {
        let phone = contact::contact_phone(external);
        let email = contact::contact_email(external);

        let mut existing = None;
        if let Some(phone) = phone.as_deref() {
            existing = self.customers.find_by_phone(tenant_id, phone, txn).await?;
        }
        if existing.is_none() {
            if let Some(email) = email.as_deref() {
                existing = self.customers.find_by_email(tenant_id, email, txn).await?;
            }
        }

        match existing {
            Some(model) => Ok(self
                .refresh_customer_contact(txn, external, model, now)
                .await?),
            None => {
                let (first_name, last_name) = contact::contact_name(external);
                let model = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant_id),
                    first_name: Set(first_name),
                    last_name: Set(last_name),
                    email: Set(email),
                    phone: Set(phone),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;
                Ok(model)
            }
        }
    }

    /// Refresh an existing customer's contact fields. Incoming empty values
    /// never overwrite stored non-empty ones.
    async fn refresh_customer_contact(
        &self,
        txn: &DatabaseTransaction,
        external: &ExternalOrder,
        model: customer::Model,
        now: DateTimeWithTimeZone,
    ) -> Result<customer::Model, MaterializeError> {
        let (first_name, last_name) = contact::contact_name(external);
        let email = contact::contact_email(external);
        let phone = contact::contact_phone(external);

        let mut active: customer::ActiveModel = model.clone().into();
        let mut dirty = false;

        if first_name.is_some() && first_name != model.first_name {
            active.first_name = Set(first_name);
            dirty = true;
        }
        if last_name.is_some() && last_name != model.last_name {
            active.last_name = Set(last_name);
            dirty = true;
        }
        if email.is_some() && email != model.email {
            active.email = Set(email);
            dirty = true;
        }
        if phone.is_some() && phone != model.phone {
            active.phone = Set(phone);
            dirty = true;
        }

        if dirty {
            active.updated_at = Set(now);
            Ok(active.update(txn).await?)
        } else {
            Ok(model)
        }
    }

    /// Upsert the customer's single address row from the resolved shipping
    /// address.
    async fn upsert_address(
        &self,
        txn: &DatabaseTransaction,
        external: &ExternalOrder,
        customer_id: Uuid,
        now: DateTimeWithTimeZone,
    ) -> Result<(), MaterializeError> {
        let resolved = contact::resolve_address(external);

        let existing = address::Entity::find()
            .filter(address::Column::CustomerId.eq(customer_id))
            .one(txn)
            .await?;

        match existing {
            Some(model) => {
                let mut active: address::ActiveModel = model.into();
                active.line1 = Set(resolved.line1);
                active.line2 = Set(resolved.line2);
                active.city = Set(resolved.city);
                active.state = Set(resolved.state);
                active.country = Set(resolved.country);
                active.pincode = Set(resolved.pincode);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
            None => {
                address::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    line1: Set(resolved.line1),
                    line2: Set(resolved.line2),
                    city: Set(resolved.city),
                    state: Set(resolved.state),
                    country: Set(resolved.country),
                    pincode: Set(resolved.pincode),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;
            }
        }

        Ok(())
    }
}

fn generate_order_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_codes_are_prefixed_and_unique() {
        let a = generate_order_code();
        let b = generate_order_code();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), "ORD-".len() + 12);
        assert_ne!(a, b);
    }

    #[test]
    fn configuration_errors_are_not_retryable() {
        assert!(!MaterializeError::MissingHub.is_retryable());
        assert!(!MaterializeError::MissingExternalId.is_retryable());
        assert!(MaterializeError::Timeout { seconds: 30 }.is_retryable());
        assert!(
            MaterializeError::Database(DbErr::Custom("connection reset".to_string()))
                .is_retryable()
        );
    }
}
