use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_warehouse_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use selection_dw::config::AppConfig;
use selection_dw::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(database) = args.database.take() {
        config.warehouse.database_path = database;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        database_path: Arc::new(config.warehouse.database_path.clone()),
    };

    let app = with_warehouse_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.warehouse.database_path.display(),
        "selection warehouse KPI service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
