use crate::cli::ServeArgs;
use crate::infra::{build_planning_loop, AppState, InMemoryAttemptSink};
use crate::routes::with_planning_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ecoplan::config::AppConfig;
use ecoplan::error::AppError;
use ecoplan::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let attempts = Arc::new(InMemoryAttemptSink::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        attempts: attempts.clone(),
    };

    let planner = Arc::new(build_planning_loop(
        &config.planner,
        None,
        Some(attempts),
    )?);
    info!(
        proposer = planner.proposer_name(),
        max_iterations = planner.settings().max_iterations,
        "planning loop configured"
    );

    let app = with_planning_routes(planner)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ecoplan service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
