//! Storefront client contract
//!
//! Defines the interface the sync pipeline uses to pull orders from the
//! external e-commerce storefront, together with the structured error
//! taxonomy the orchestrator's retry logic keys off. One client call yields
//! one page; the client does not enforce rate limits itself.

pub mod rest;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::connection::Model as Connection;
pub use rest::RestStorefrontClient;
pub use types::{ExternalAddress, ExternalCustomer, ExternalLineItem, ExternalOrder};

/// Query filters for paginated order retrieval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilters {
    /// Order status filter (e.g. "any", "open")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Creation-date lower bound (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_min: Option<DateTime<Utc>>,
    /// Creation-date upper bound (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_max: Option<DateTime<Utc>>,
    /// Page-size limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl OrderFilters {
    /// True when the caller supplied at least one creation-date bound.
    pub fn has_date_bounds(&self) -> bool {
        self.created_at_min.is_some() || self.created_at_max.is_some()
    }

    /// Filters covering the last `days` days up to `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            created_at_min: Some(now - Duration::days(days)),
            ..Default::default()
        }
    }

    /// Filters covering the last `hours` hours up to `now`.
    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            created_at_min: Some(now - Duration::hours(hours)),
            ..Default::default()
        }
    }
}

/// Storefront-specific error types for structured error handling
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorefrontError {
    /// HTTP error from the storefront
    #[error("storefront returned HTTP {status}")]
    Http { status: u16, body: Option<String> },

    /// Rate limited with optional retry-after hint
    #[error("storefront rate limited (retry after {retry_after_secs:?})")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Authentication/authorization failure
    #[error("storefront authentication failed: {details}")]
    Unauthorized { details: String },

    /// Network or connectivity error
    #[error("storefront network error: {details}")]
    Network { details: String, retryable: bool },

    /// Malformed response from the storefront
    #[error("malformed storefront response: {details}")]
    Malformed { details: String },
}

impl StorefrontError {
    /// Whether the failure is worth retrying with backoff.
    ///
    /// Auth failures and 4xx responses are permanent; timeouts, 5xx and rate
    /// limits are transient. A malformed body is treated as transient since
    /// it usually indicates a truncated response.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorefrontError::RateLimited { .. } => true,
            StorefrontError::Unauthorized { .. } => false,
            StorefrontError::Http { status, .. } => *status >= 500,
            StorefrontError::Network { retryable, .. } => *retryable,
            StorefrontError::Malformed { .. } => true,
        }
    }
}

/// Client for paginated retrieval of orders from the external storefront.
#[async_trait]
pub trait StorefrontClient: Send + Sync {
    /// Fetch one page of orders matching the given filters.
    async fn fetch_orders(
        &self,
        connection: &Connection,
        filters: &OrderFilters,
    ) -> Result<Vec<ExternalOrder>, StorefrontError>;
}
