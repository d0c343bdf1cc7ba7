use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::carbon_intensity::domain::{
    ActorId, DataQuality, EmissionComponents, FeedstockId, Methodology, ReportId, ReportStatus,
    ReportSubmission, ReportingPeriod, Scope1Inputs, Scope2Inputs, Scope3Inputs, SupplierId,
};
use crate::workflows::carbon_intensity::factors::FactorTable;
use crate::workflows::carbon_intensity::repository::{
    AuditLogEntry, Certificate, CertificateError, CertificateGenerator, CertificateRequest,
    ReportRecord, ReportRepository, RepositoryError, StatusChange,
};
use crate::workflows::carbon_intensity::{
    report_router, AssessmentConfig, CarbonIntensityService, InMemoryReportRepository,
    RatingTable,
};

pub(super) type MemoryService = CarbonIntensityService<InMemoryReportRepository, MemoryCertificates>;

/// scope1 = (5, 3, 2), scope2 = (4, 1), scope3 = (2, 1, 1, 1); total 20.
pub(super) fn scenario_components() -> EmissionComponents {
    EmissionComponents {
        scope1: Scope1Inputs {
            cultivation: 5.0,
            processing: 3.0,
            transport: 2.0,
        },
        scope2: Scope2Inputs {
            electricity: 4.0,
            heat: 1.0,
        },
        scope3: Scope3Inputs {
            upstream_inputs: 2.0,
            land_use_change: 1.0,
            distribution: 1.0,
            end_of_life: 1.0,
        },
    }
}

pub(super) fn rating_table() -> RatingTable {
    "A:10,B:20,C:35,D:50,E".parse().expect("test table parses")
}

pub(super) fn assessment_config() -> AssessmentConfig {
    AssessmentConfig::new(rating_table())
        .with_fossil_baseline(89.0)
        .expect("baseline is valid")
}

pub(super) fn factor_table() -> FactorTable {
    let mut used_cooking_oil = scenario_components();
    used_cooking_oil.scope3.land_use_change = 0.0;
    FactorTable::from_entries([
        ("used_cooking_oil", used_cooking_oil),
        ("wheat_straw", scenario_components()),
    ])
    .expect("factor fixtures are valid")
}

pub(super) fn reporting_period() -> ReportingPeriod {
    ReportingPeriod {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        end: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
        reference_year: 2024,
    }
}

pub(super) fn submission() -> ReportSubmission {
    ReportSubmission {
        supplier_id: Some(SupplierId("supplier-42".to_string())),
        feedstock_id: Some(FeedstockId("feedstock-uco-7".to_string())),
        feedstock_category: None,
        methodology: Some(Methodology::RedIi),
        data_quality: Some(DataQuality::Measured),
        reporting_period: Some(reporting_period()),
        components: Some(scenario_components()),
        calculation_notes: Some("mass balance, 2024 crush season".to_string()),
        submit: true,
    }
}

pub(super) fn draft_submission() -> ReportSubmission {
    ReportSubmission {
        submit: false,
        ..submission()
    }
}

pub(super) fn auditor() -> ActorId {
    ActorId("auditor-ines".to_string())
}

pub(super) fn second_auditor() -> ActorId {
    ActorId("auditor-tomas".to_string())
}

pub(super) fn supplier() -> ActorId {
    ActorId("supplier-42".to_string())
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryReportRepository>,
    Arc<MemoryCertificates>,
) {
    let repository = Arc::new(InMemoryReportRepository::default());
    let certificates = Arc::new(MemoryCertificates::default());
    let service = CarbonIntensityService::new(
        repository.clone(),
        certificates.clone(),
        Arc::new(factor_table()),
        assessment_config(),
    );
    (service, repository, certificates)
}

pub(super) fn service_with<R: ReportRepository + 'static>(
    repository: R,
) -> CarbonIntensityService<R, MemoryCertificates> {
    CarbonIntensityService::new(
        Arc::new(repository),
        Arc::new(MemoryCertificates::default()),
        Arc::new(factor_table()),
        assessment_config(),
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryCertificates {
    issued: Arc<Mutex<Vec<Certificate>>>,
}

impl MemoryCertificates {
    pub(super) fn issued(&self) -> Vec<Certificate> {
        self.issued.lock().expect("certificate mutex poisoned").clone()
    }
}

impl CertificateGenerator for MemoryCertificates {
    fn issue(&self, request: CertificateRequest) -> Result<Certificate, CertificateError> {
        let CertificateRequest {
            record,
            verification,
        } = request;
        let certificate = Certificate {
            certificate_number: format!("CERT-{}", record.report_id.0),
            report_id: record.report_id,
            supplier_id: record.draft.supplier_id,
            feedstock_id: record.draft.feedstock_id,
            reporting_period: record.draft.reporting_period,
            total_ci_value: record.assessment.totals.total_ci_value(),
            rating: record.assessment.rating.label,
            ghg_savings_percentage: record.assessment.ghg_savings_percentage,
            compliance: record.assessment.compliance,
            verified_by: verification.actor,
            verified_at: verification.recorded_at,
            issued_at: Utc::now(),
        };
        self.issued
            .lock()
            .expect("certificate mutex poisoned")
            .push(certificate.clone());
        Ok(certificate)
    }
}

/// Store whose writes always fail, for persistence-error paths.
pub(super) struct UnavailableRepository;

impl ReportRepository for UnavailableRepository {
    fn insert(&self, _record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReportId) -> Result<Option<ReportRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_draft(&self, _record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_transition(
        &self,
        _change: StatusChange,
    ) -> Result<(ReportRecord, AuditLogEntry), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn audit_log(&self, _id: &ReportId) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_status(
        &self,
        _status: ReportStatus,
        _limit: usize,
    ) -> Result<Vec<ReportRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Store that reads fine but refuses to commit transitions, so the record must
/// stay in its pre-call state.
#[derive(Default, Clone)]
pub(super) struct ReadOnlyRepository {
    pub(super) inner: InMemoryReportRepository,
}

impl ReportRepository for ReadOnlyRepository {
    fn insert(&self, record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn replace_draft(&self, _record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn commit_transition(
        &self,
        _change: StatusChange,
    ) -> Result<(ReportRecord, AuditLogEntry), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn audit_log(&self, id: &ReportId) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.inner.audit_log(id)
    }

    fn by_status(
        &self,
        status: ReportStatus,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, RepositoryError> {
        self.inner.by_status(status, limit)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    report_router(Arc::new(service))
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
