use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActorId, ReportId, ReportRevision, ReportStatus, ReportSubmission};
use super::intake::ValidationError;
use super::lifecycle::{ActionKind, TransitionError, VerificationAction};
use super::repository::{CertificateGenerator, ReportRepository, RepositoryError};
use super::service::{CarbonIntensityService, ReportServiceError};

const DEFAULT_QUEUE_LIMIT: usize = 50;

/// Body of `POST /api/v1/ci-reports/:report_id/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub action: ActionKind,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueParams {
    pub status: ReportStatus,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Router builder exposing the reporting and verification endpoints.
pub fn report_router<R, C>(service: Arc<CarbonIntensityService<R, C>>) -> Router
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    Router::new()
        .route(
            "/api/v1/ci-reports",
            post(create_handler::<R, C>).get(queue_handler::<R, C>),
        )
        .route("/api/v1/ci-reports/:report_id", get(get_handler::<R, C>))
        .route(
            "/api/v1/ci-reports/:report_id/components",
            put(revise_handler::<R, C>),
        )
        .route(
            "/api/v1/ci-reports/:report_id/verify",
            post(verify_handler::<R, C>),
        )
        .route(
            "/api/v1/ci-reports/:report_id/certificate",
            get(certificate_handler::<R, C>),
        )
        .route(
            "/api/v1/emission-factors/:category",
            get(factors_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Json(submission): Json<ReportSubmission>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    match service.create(submission) {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Path(report_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    match service.get(&ReportId(report_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn revise_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Path(report_id): Path<String>,
    Json(revision): Json<ReportRevision>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    match service.revise(&ReportId(report_id), revision) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Path(report_id): Path<String>,
    Json(request): Json<VerifyRequest>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    let VerifyRequest {
        action,
        actor_id,
        notes,
        rejection_reason,
    } = request;

    let actor = match actor_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => ActorId(id),
        None => {
            return error_response(ValidationError::MissingField("actor_id").into());
        }
    };
    let action = match VerificationAction::from_parts(action, notes, rejection_reason) {
        Ok(action) => action,
        Err(error) => return error_response(error.into()),
    };

    match service.verify(&ReportId(report_id), action, actor) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn certificate_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Path(report_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    match service.certificate(&ReportId(report_id)) {
        Ok(certificate) => (StatusCode::OK, Json(certificate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    let limit = params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.queue(params.status, limit) {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn factors_handler<R, C>(
    State(service): State<Arc<CarbonIntensityService<R, C>>>,
    Path(category): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    match service.defaults_for(&category) {
        Ok(components) => {
            let payload = json!({
                "category": category,
                "components": components,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(ReportServiceError::Validation(ValidationError::UnknownFeedstockCategory(_))) => {
            let payload = json!({
                "error": "not_found",
                "message": format!("no default emission factors for `{category}`"),
                "known_categories": service.factor_categories(),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &ReportServiceError) -> StatusCode {
    match error {
        ReportServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReportServiceError::Transition(TransitionError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        ReportServiceError::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReportServiceError::NotEditable(_) | ReportServiceError::CertificateUnavailable(_) => {
            StatusCode::CONFLICT
        }
        ReportServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReportServiceError::Repository(_) | ReportServiceError::Certificate(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: ReportServiceError) -> Response {
    let status = status_for(&error);
    let payload = json!({
        "error": error.kind(),
        "message": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
