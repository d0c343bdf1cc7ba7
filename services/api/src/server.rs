use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_report_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use carbon_ci::config::AppConfig;
use carbon_ci::error::AppError;
use carbon_ci::telemetry;
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

    // Refuse to serve without a rating table.
    let assessment = config.reporting.assessment_config()?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let bands = assessment.rating_table.bands().len() + 1;
    let fossil_baseline = assessment.fossil_baseline;
    let service = Arc::new(build_service(&config.reporting, assessment)?);
    let categories = service.factor_categories().len();

    let app = with_report_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        fossil_baseline,
        rating_bands = bands,
        factor_categories = categories,
        "carbon-intensity service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
