use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use middleware::rate_limit::{limit_middleware, RpsLimit};
use services::analysis::AnalysisService;
use services::collector::{CollectorService, RunRegistry};
use services::hh_client::HhClient;
use services::snapshot::SnapshotService;
use store::CorpusStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CorpusStore>,
    pub collector: CollectorService,
    pub snapshots: SnapshotService,
    pub analyses: AnalysisService,
    pub runs: Arc<RunRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn CorpusStore>, client: HhClient, page_delay: Duration) -> Self {
        Self {
            collector: CollectorService::new(store.clone(), client, page_delay),
            snapshots: SnapshotService::new(store.clone()),
            analyses: AnalysisService::new(store.clone()),
            runs: Arc::new(RunRegistry::new()),
            store,
        }
    }
}

/// Full application router. The API surface sits behind the fixed-window
/// rate limit; the health probe does not.
pub fn router(state: AppState, rps: u32) -> Router {
    let api = Router::new()
        .route("/admin/collections", post(routes::collection::start_collection))
        .route(
            "/admin/collections/:id",
            get(routes::collection::get_collection),
        )
        .route(
            "/admin/collections/:id/cancel",
            post(routes::collection::cancel_collection),
        )
        .route(
            "/tenants/:tenant_id/snapshot",
            post(routes::snapshot::create_snapshot),
        )
        .route(
            "/tenants/:tenant_id/analyses",
            post(routes::analysis::create_analysis).get(routes::analysis::list_analyses),
        )
        .route(
            "/tenants/:tenant_id/analyses/:id",
            get(routes::analysis::get_analysis),
        )
        .layer(axum::middleware::from_fn_with_state(
            RpsLimit::new(rps),
            limit_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
