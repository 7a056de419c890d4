use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::analysis_dto::{AnalysisSortQuery, CreateAnalysisRequest};
use crate::error::Result;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/tenants/{tenant_id}/analyses",
    tag = "analyses",
    params(("tenant_id" = Uuid, Path, description = "Tenant id")),
    request_body = CreateAnalysisRequest,
    responses(
        (status = 201, description = "Analysis created"),
        (status = 400, description = "Tenant corpus is empty"),
    )
)]
#[axum::debug_handler]
pub async fn create_analysis(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<CreateAnalysisRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let analysis = state
        .analyses
        .create(tenant_id, payload.name, payload.template)
        .await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

#[utoipa::path(
    get,
    path = "/api/tenants/{tenant_id}/analyses",
    tag = "analyses",
    params(("tenant_id" = Uuid, Path, description = "Tenant id")),
    responses((status = 200, description = "Analyses, newest first"))
)]
#[axum::debug_handler]
pub async fn list_analyses(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let analyses = state.analyses.list(tenant_id).await?;
    Ok(Json(analyses))
}

#[utoipa::path(
    get,
    path = "/api/tenants/{tenant_id}/analyses/{id}",
    tag = "analyses",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant id"),
        ("id" = Uuid, Path, description = "Analysis id"),
        ("sort" = Option<String>, Query, description = "popularity | min_salary | max_salary | avg_salary"),
    ),
    responses(
        (status = 200, description = "Analysis with sorted skill stats"),
        (status = 404, description = "Unknown analysis"),
    )
)]
#[axum::debug_handler]
pub async fn get_analysis(
    State(state): State<AppState>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AnalysisSortQuery>,
) -> Result<impl IntoResponse> {
    let analysis = state.analyses.get(tenant_id, id, query.sort).await?;
    Ok(Json(analysis))
}
