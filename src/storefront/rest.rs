//! REST implementation of the storefront client.
//!
//! Fetches one page of orders per call from the storefront Admin API,
//! mapping HTTP failures into the structured storefront error taxonomy.
//! Pagination across pages is driven by the orchestrator re-running sync
//! jobs; this client never follows cursors itself.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{ExternalOrder, OrderFilters, StorefrontClient, StorefrontError};
use crate::models::connection::Model as Connection;

/// Access-token header expected by the storefront Admin API.
const ACCESS_TOKEN_HEADER: &str = "X-Storefront-Access-Token";

/// Response envelope of the orders endpoint.
#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<ExternalOrder>,
}

/// Production storefront client speaking the Admin REST API.
#[derive(Debug, Clone)]
pub struct RestStorefrontClient {
    http: reqwest::Client,
    api_version: String,
    /// Base URL override; when unset the URL is derived from the
    /// connection's shop domain. Primarily for tests.
    api_base: Option<Url>,
}

impl RestStorefrontClient {
    /// Create a client for the given Admin API version.
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_version: api_version.into(),
            api_base: None,
        }
    }

    /// Override the API base URL (useful for tests).
    pub fn with_api_base(mut self, base: Url) -> Self {
        self.api_base = Some(base);
        self
    }

    fn orders_url(&self, connection: &Connection) -> Result<Url, StorefrontError> {
        let base = match &self.api_base {
            Some(base) => base.clone(),
            None => Url::parse(&format!("https://{}", connection.shop_domain)).map_err(|e| {
                StorefrontError::Network {
                    details: format!("invalid shop domain '{}': {}", connection.shop_domain, e),
                    retryable: false,
                }
            })?,
        };

        base.join(&format!("/admin/api/{}/orders.json", self.api_version))
            .map_err(|e| StorefrontError::Network {
                details: format!("failed to build orders URL: {}", e),
                retryable: false,
            })
    }
}

#[async_trait]
impl StorefrontClient for RestStorefrontClient {
    async fn fetch_orders(
        &self,
        connection: &Connection,
        filters: &OrderFilters,
    ) -> Result<Vec<ExternalOrder>, StorefrontError> {
        let mut url = self.orders_url(connection)?;

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = &filters.status {
                pairs.append_pair("status", status);
            }
            if let Some(min) = &filters.created_at_min {
                pairs.append_pair("created_at_min", &min.to_rfc3339());
            }
            if let Some(max) = &filters.created_at_max {
                pairs.append_pair("created_at_max", &max.to_rfc3339());
            }
            if let Some(limit) = filters.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        debug!(shop_domain = %connection.shop_domain, url = %url, "Fetching storefront orders page");

        let response = self
            .http
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &connection.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StorefrontError::Network {
                details: e.to_string(),
                retryable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            warn!(
                shop_domain = %connection.shop_domain,
                retry_after = ?retry_after,
                "Storefront rate limited the orders request"
            );

            return Err(StorefrontError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StorefrontError::Unauthorized {
                details: format!("storefront rejected the access token ({})", status),
            });
        }

        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(StorefrontError::Http {
                status: status.as_u16(),
                body: body.map(|b| b.chars().take(200).collect()),
            });
        }

        let envelope: OrdersEnvelope =
            response
                .json()
                .await
                .map_err(|e| StorefrontError::Malformed {
                    details: e.to_string(),
                })?;

        debug!(
            shop_domain = %connection.shop_domain,
            count = envelope.orders.len(),
            "Fetched storefront orders page"
        );

        Ok(envelope.orders)
    }
}
