use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use selection_dw::error::AppError;
use selection_dw::report::{open_read_only, KpiReport, ReportError};
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) fn with_warehouse_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/kpis", get(kpis_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Runs the KPI queries on the blocking pool with a fresh read-only connection.
pub(crate) async fn kpis_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<KpiReport>, AppError> {
    let database_path = state.database_path.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<KpiReport, ReportError> {
        let conn = open_read_only(database_path.as_path())?;
        KpiReport::collect(&conn)
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(Json(report))
}
