//! # Data Models
//!
//! This module contains all the data models used throughout the order sync
//! service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod address;
pub mod connection;
pub mod customer;
pub mod hub;
pub mod order;
pub mod order_item;
pub mod package;
pub mod seller_details;
pub mod shipment;
pub mod sync_job;
pub mod tenant;

pub use address::Entity as Address;
pub use connection::Entity as Connection;
pub use customer::Entity as Customer;
pub use hub::Entity as Hub;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use package::Entity as Package;
pub use seller_details::Entity as SellerDetails;
pub use shipment::Entity as Shipment;
pub use sync_job::Entity as SyncJob;
pub use tenant::Entity as Tenant;

/// Channel identifier for orders pulled from the external storefront.
pub const CHANNEL_STOREFRONT: &str = "storefront";

/// Shipment state assigned at creation.
pub const SHIPMENT_STATUS_NEW: &str = "NEW";

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "ordersync".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
