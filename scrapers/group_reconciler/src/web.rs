use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::differ::{diff, GroupDiff, LocalState};
use crate::error::{SnapshotError, StoreError};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::results::ResultImporter;
use crate::snapshot::{ExternalSnapshot, RawSnapshot};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub importer: Option<Arc<dyn ResultImporter>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Snapshot(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    Json(Health { status: "ok" })
}

/// Typed diff for the review UI; writes nothing.
#[axum::debug_handler]
pub async fn diff_handler(
    State(state): State<AppState>,
    Json(raw): Json<RawSnapshot>,
) -> Result<Json<GroupDiff>, ApiError> {
    let snapshot = ExternalSnapshot::try_from(raw)?;
    let local = LocalState::load(state.store.as_ref(), &snapshot.group).await?;
    Ok(Json(diff(&snapshot.group, &snapshot, &local)))
}

#[axum::debug_handler]
pub async fn reconcile_handler(
    State(state): State<AppState>,
    Json(raw): Json<RawSnapshot>,
) -> Result<Json<ReconcileReport>, ApiError> {
    let snapshot = ExternalSnapshot::try_from(raw)?;
    let mut reconciler = Reconciler::new(state.store.as_ref());
    if let Some(importer) = &state.importer {
        reconciler = reconciler.with_importer(importer.as_ref());
    }
    Ok(Json(reconciler.reconcile(&snapshot.group, &snapshot).await))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/groups/diff", post(diff_handler))
        .route("/groups/reconcile", post(reconcile_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, config: &ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Review API available at http://{}", addr);
    axum::serve(listener, router(state)).await
}
