//! External-order synchronization pipeline.
//!
//! The job-queue driven machinery that pulls orders from the storefront
//! into the local order/shipment data model: typed job payloads, the
//! durable queue, the worker pool, the per-variant orchestrator, and the
//! transactional order materializer with its supporting derivations
//! (payment, package dimensions, contact normalization).

pub mod contact;
pub mod dimensions;
pub mod job;
pub mod materializer;
pub mod orchestrator;
pub mod payment;
pub mod queue;
pub mod worker;

pub use job::JobKind;
pub use materializer::{MaterializeAction, MaterializeError, MaterializeOutcome, OrderMaterializer};
pub use orchestrator::{BatchOutcome, DispatchError, SyncOrchestrator};
pub use queue::{JobQueue, QueueError};
pub use worker::{StartLimiter, SyncWorker};
