use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use carbon_ci::error::AppError;
use carbon_ci::workflows::carbon_intensity::{
    report_router, CarbonAssessment, CarbonIntensityService, CertificateGenerator,
    EmissionComponents, ReportRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_report_routes<R, C>(service: Arc<CarbonIntensityService<R, C>>) -> axum::Router
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    report_router(service.clone())
        .route(
            "/api/v1/ci-assessments/preview",
            post(preview_endpoint::<R, C>),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
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

/// Derive totals, rating and scheme flags for components without storing a report.
pub(crate) async fn preview_endpoint<R, C>(
    Extension(service): Extension<Arc<CarbonIntensityService<R, C>>>,
    Json(components): Json<EmissionComponents>,
) -> Result<Json<CarbonAssessment>, AppError>
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    Ok(Json(service.preview(&components)?))
}
