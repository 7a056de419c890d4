use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::snapshot_dto::{SnapshotRequest, SnapshotResponse};
use crate::error::Result;
use crate::AppState;

/// Rebuilds the tenant corpus from the shared corpus using the given
/// title queries and filter. Synchronous, the response carries the copy
/// count.
#[utoipa::path(
    post,
    path = "/api/tenants/{tenant_id}/snapshot",
    tag = "snapshots",
    params(("tenant_id" = Uuid, Path, description = "Tenant id")),
    request_body = SnapshotRequest,
    responses((status = 200, description = "Tenant corpus replaced", body = SnapshotResponse))
)]
#[axum::debug_handler]
pub async fn create_snapshot(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<SnapshotRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    if let Some(template) = payload.template.as_deref() {
        info!(%tenant_id, template, "Snapshot from saved search");
    }

    let copied = state
        .snapshots
        .copy(tenant_id, &payload.queries, &payload.filter)
        .await?;
    Ok(Json(SnapshotResponse { copied }))
}
