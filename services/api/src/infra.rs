use carbon_ci::config::{parse_baseline, ReportingConfig};
use carbon_ci::error::AppError;
use carbon_ci::workflows::carbon_intensity::{
    AssessmentConfig, CarbonIntensityService, Certificate, CertificateError,
    CertificateGenerator, CertificateRequest, FactorTable, InMemoryReportRepository, RatingTable,
    ReportId,
};
use chrono::{Datelike, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

pub(crate) type ApiService = CarbonIntensityService<InMemoryReportRepository, LocalCertificateGenerator>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Issues sequentially numbered certificates in-process. A report keeps the
/// certificate it was first issued.
#[derive(Default)]
pub(crate) struct LocalCertificateGenerator {
    issued: Mutex<HashMap<ReportId, Certificate>>,
}

impl LocalCertificateGenerator {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ReportId, Certificate>>, CertificateError> {
        self.issued
            .lock()
            .map_err(|_| CertificateError::Transport("certificate ledger lock poisoned".to_string()))
    }

    pub(crate) fn issued(&self) -> Result<usize, CertificateError> {
        Ok(self.lock()?.len())
    }
}

impl CertificateGenerator for LocalCertificateGenerator {
    fn issue(&self, request: CertificateRequest) -> Result<Certificate, CertificateError> {
        let CertificateRequest {
            record,
            verification,
        } = request;
        let mut issued = self.lock()?;
        if let Some(existing) = issued.get(&record.report_id) {
            return Ok(existing.clone());
        }

        let serial = issued.len() + 1;
        let certificate = Certificate {
            certificate_number: format!("CI-{}-{serial:05}", verification.recorded_at.year()),
            report_id: record.report_id.clone(),
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
        issued.insert(record.report_id, certificate.clone());
        Ok(certificate)
    }
}

/// Default factor table from `CI_DEFAULT_FACTORS_CSV`, or an empty table.
pub(crate) fn load_factor_table(path: Option<&Path>) -> Result<FactorTable, AppError> {
    match path {
        Some(path) => {
            let table = FactorTable::from_path(path)?;
            info!(path = %path.display(), categories = table.len(), "default emission factors loaded");
            Ok(table)
        }
        None => Ok(FactorTable::default()),
    }
}

pub(crate) fn build_service(
    reporting: &ReportingConfig,
    assessment: AssessmentConfig,
) -> Result<ApiService, AppError> {
    let factors = load_factor_table(reporting.default_factors_csv.as_deref())?;
    Ok(CarbonIntensityService::new(
        Arc::new(InMemoryReportRepository::default()),
        Arc::new(LocalCertificateGenerator::default()),
        Arc::new(factors),
        assessment,
    ))
}

pub(crate) fn parse_rating_table(raw: &str) -> Result<RatingTable, String> {
    raw.parse::<RatingTable>()
        .map_err(|err| format!("invalid rating thresholds '{raw}' ({err})"))
}

pub(crate) fn parse_fossil_baseline(raw: &str) -> Result<f64, String> {
    parse_baseline(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_ci::workflows::carbon_intensity::{
        ActorId, DataQuality, EmissionComponents, FeedstockId, Methodology, ReportSubmission,
        ReportingPeriod, Scope1Inputs, SupplierId, VerificationAction,
    };
    use chrono::NaiveDate;

    fn approved_report(service: &ApiService, supplier: &str) -> ReportId {
        let submission = ReportSubmission {
            supplier_id: Some(SupplierId(supplier.to_string())),
            feedstock_id: Some(FeedstockId("feedstock-uco-1".to_string())),
            feedstock_category: None,
            methodology: Some(Methodology::RedIi),
            data_quality: Some(DataQuality::Measured),
            reporting_period: Some(ReportingPeriod {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
                end: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
                reference_year: 2024,
            }),
            components: Some(EmissionComponents {
                scope1: Scope1Inputs {
                    cultivation: 5.0,
                    processing: 3.0,
                    transport: 2.0,
                },
                ..EmissionComponents::default()
            }),
            calculation_notes: None,
            submit: true,
        };
        let auditor = ActorId("auditor-1".to_string());
        let report = service.create(submission).expect("report created");
        service
            .verify(&report.report_id, VerificationAction::StartReview, auditor.clone())
            .expect("review starts");
        service
            .verify(
                &report.report_id,
                VerificationAction::Approve { notes: None },
                auditor,
            )
            .expect("report approved");
        report.report_id
    }

    #[test]
    fn repeated_certificate_reads_return_the_same_certificate() {
        let certificates = Arc::new(LocalCertificateGenerator::default());
        let service = CarbonIntensityService::new(
            Arc::new(InMemoryReportRepository::default()),
            certificates.clone(),
            Arc::new(FactorTable::default()),
            AssessmentConfig::new("A:10,B:20,C:35,D:50,E".parse().expect("table parses")),
        );
        let report_id = approved_report(&service, "supplier-1");

        let first = service.certificate(&report_id).expect("first read");
        let second = service.certificate(&report_id).expect("second read");
        assert_eq!(first.certificate_number, second.certificate_number);
        assert_eq!(first, second);
        assert_eq!(certificates.issued().expect("ledger readable"), 1);

        let other_id = approved_report(&service, "supplier-2");
        let other = service.certificate(&other_id).expect("other report");
        assert_ne!(other.certificate_number, first.certificate_number);
        assert!(other.certificate_number.ends_with("-00002"));
        assert_eq!(certificates.issued().expect("ledger readable"), 2);
    }
}
