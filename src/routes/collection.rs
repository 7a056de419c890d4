use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::dto::collection_dto::{
    CancelCollectionResponse, StartCollectionRequest, StartCollectionResponse,
};
use crate::error::Result;
use crate::services::collector::{ProgressSink, RunStatus};
use crate::AppState;

/// Accepts a collection run and returns immediately; the run proceeds in
/// the background and is observed by polling `get_collection`.
#[utoipa::path(
    post,
    path = "/api/admin/collections",
    tag = "collections",
    request_body = StartCollectionRequest,
    responses(
        (status = 202, description = "Run accepted", body = StartCollectionResponse),
        (status = 409, description = "Another run is already in progress"),
    )
)]
#[axum::debug_handler]
pub async fn start_collection(
    State(state): State<AppState>,
    Json(payload): Json<StartCollectionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let (run_id, cancel) = state.runs.begin(&payload.query)?;
    let (sink, mut rx) = ProgressSink::channel();

    let registry = state.runs.clone();
    let drain = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            registry.push_event(run_id, event);
        }
    });

    let collector = state.collector.clone();
    let registry = state.runs.clone();
    let query = payload.query.clone();
    tokio::spawn(async move {
        let outcome = collector.collect(&query, &cancel, &sink).await;
        // Close the channel and let the drain task flush every event
        // before the final status becomes visible.
        drop(sink);
        let _ = drain.await;
        match outcome {
            Ok(accepted) => registry.finish(run_id, RunStatus::Completed, accepted),
            Err(e) => {
                error!(%run_id, query, error = %e, "Collection run failed");
                registry.finish(run_id, RunStatus::Failed, 0);
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartCollectionResponse { run_id }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/collections/{id}/cancel",
    tag = "collections",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 202, description = "Cancellation requested", body = CancelCollectionResponse),
        (status = 404, description = "Unknown run"),
    )
)]
#[axum::debug_handler]
pub async fn cancel_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.runs.cancel(id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelCollectionResponse {
            run_id: id,
            cancelling: true,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/collections/{id}",
    tag = "collections",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run status and progress events"),
        (status = 404, description = "Unknown run"),
    )
)]
#[axum::debug_handler]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let snapshot = state.runs.snapshot(id)?;
    Ok(Json(snapshot))
}
