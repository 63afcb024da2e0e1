//! # Sync API Handlers
//!
//! Manual trigger, status check, and failed-order retry endpoints for the
//! order sync pipeline. All three are thin wrappers over the job queue and
//! the per-tenant status store.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::tenant::Entity as Tenant;
use crate::server::AppState;
use crate::storefront::OrderFilters;
use crate::sync::JobKind;

/// Request body for a manual sync trigger
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ManualSyncRequest {
    /// Order status filter (e.g. "any")
    pub status: Option<String>,
    /// Creation-date lower bound (RFC3339)
    pub created_at_min: Option<DateTime<Utc>>,
    /// Creation-date upper bound (RFC3339)
    pub created_at_max: Option<DateTime<Utc>>,
    /// Page-size limit
    pub limit: Option<u32>,
}

impl From<ManualSyncRequest> for OrderFilters {
    fn from(request: ManualSyncRequest) -> Self {
        OrderFilters {
            status: request.status,
            created_at_min: request.created_at_min,
            created_at_max: request.created_at_max,
            limit: request.limit,
        }
    }
}

/// Response for trigger endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncTriggerResponse {
    /// Identifier of the enqueued job
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub job_id: String,
    /// Type of the enqueued job
    #[schema(example = "manual-sync")]
    pub job_type: String,
}

/// Per-tenant sync status
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    /// Timestamp of the last completed sync (RFC3339)
    #[schema(example = "2025-06-10T08:30:00Z")]
    pub last_sync_time: Option<String>,
    /// Number of orders parked in the failed list
    #[schema(example = 0)]
    pub failed_orders_count: usize,
}

async fn require_tenant(state: &AppState, tenant_id: Uuid) -> Result<(), ApiError> {
    let tenant = Tenant::find_by_id(tenant_id).one(&state.db).await?;

    if tenant.is_none() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Tenant not found",
        ));
    }

    Ok(())
}

fn enqueue_failure(err: crate::sync::QueueError) -> ApiError {
    tracing::error!(error = %err, "Failed to enqueue sync job");
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_SERVER_ERROR",
        "Failed to enqueue sync job",
    )
}

/// Trigger a manual sync for the tenant
#[utoipa::path(
    post,
    path = "/sync/{tenant_id}",
    params(("tenant_id" = Uuid, Path, description = "Tenant identifier")),
    request_body(content = ManualSyncRequest, description = "Optional filters", content_type = "application/json"),
    responses(
        (status = 202, description = "Sync job enqueued", body = SyncTriggerResponse),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn trigger_sync(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    body: Option<Json<ManualSyncRequest>>,
) -> Result<(StatusCode, Json<SyncTriggerResponse>), ApiError> {
    require_tenant(&state, tenant_id).await?;

    let filters: OrderFilters = body.map(|Json(request)| request.into()).unwrap_or_default();
    let kind = JobKind::ManualSync { filters };

    let job = state
        .queue
        .enqueue(
            Some(tenant_id),
            &kind,
            kind.default_priority(),
            Duration::ZERO,
        )
        .await
        .map_err(enqueue_failure)?;

    tracing::info!(tenant_id = %tenant_id, job_id = %job.id, "Manual sync requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(SyncTriggerResponse {
            job_id: job.id.to_string(),
            job_type: job.job_type,
        }),
    ))
}

/// Read the tenant's sync status
#[utoipa::path(
    get,
    path = "/sync/{tenant_id}/status",
    params(("tenant_id" = Uuid, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Current sync status", body = SyncStatusResponse),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_status(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    require_tenant(&state, tenant_id).await?;

    let last_sync = state.status.last_sync(tenant_id).await;
    let failed_orders_count = state.status.failed_orders_count(tenant_id).await;

    Ok(Json(SyncStatusResponse {
        last_sync_time: last_sync.map(|at| at.to_rfc3339()),
        failed_orders_count,
    }))
}

/// Re-enqueue the tenant's parked failed orders
#[utoipa::path(
    post,
    path = "/sync/{tenant_id}/retry",
    params(("tenant_id" = Uuid, Path, description = "Tenant identifier")),
    responses(
        (status = 202, description = "Retry job enqueued", body = SyncTriggerResponse),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn retry_failed_orders(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SyncTriggerResponse>), ApiError> {
    require_tenant(&state, tenant_id).await?;

    let kind = JobKind::RetryFailedOrders;
    let job = state
        .queue
        .enqueue(
            Some(tenant_id),
            &kind,
            kind.default_priority(),
            Duration::ZERO,
        )
        .await
        .map_err(enqueue_failure)?;

    tracing::info!(tenant_id = %tenant_id, job_id = %job.id, "Failed-order retry requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(SyncTriggerResponse {
            job_id: job.id.to_string(),
            job_type: job.job_type,
        }),
    ))
}
