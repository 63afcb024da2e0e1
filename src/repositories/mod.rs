//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access
//! with tenant-aware methods.

pub mod connection;
pub mod customer;
pub mod hub;
pub mod order;
pub mod sync_status;

pub use connection::ConnectionRegistry;
pub use customer::CustomerRepository;
pub use hub::HubRepository;
pub use order::OrderRepository;
pub use sync_status::{InMemorySyncStatusStore, SyncStatusStore};
