//! End-to-end scenarios for carbon-intensity reporting and verification, driven
//! through the public service facade and HTTP router.

mod common {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};

    use carbon_ci::workflows::carbon_intensity::domain::{
        DataQuality, FeedstockId, Methodology, ReportSubmission, ReportingPeriod, SupplierId,
    };
    use carbon_ci::workflows::carbon_intensity::{
        AssessmentConfig, CarbonIntensityService, Certificate, CertificateError,
        CertificateGenerator, CertificateRequest, FactorTable, InMemoryReportRepository,
        RatingTable,
    };

    pub(super) const FACTORS_CSV: &str = "\
category,s1_cultivation,s1_processing,s1_transport,s2_electricity,s2_heat,s3_upstream_inputs,s3_land_use_change,s3_distribution,s3_end_of_life
Used Cooking Oil,5,3,2,4,1,2,1,1,1
corn-stover,9.5,7.0,3.0,6.0,2.5,4.0,12.0,1.5,0.5
";

    pub(super) type Service = CarbonIntensityService<InMemoryReportRepository, StampingCertificates>;

    /// Certificate generator that numbers certificates after the report.
    #[derive(Default)]
    pub(super) struct StampingCertificates;

    impl CertificateGenerator for StampingCertificates {
        fn issue(&self, request: CertificateRequest) -> Result<Certificate, CertificateError> {
            let CertificateRequest {
                record,
                verification,
            } = request;
            Ok(Certificate {
                certificate_number: format!("CERT-{}", record.report_id),
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
            })
        }
    }

    pub(super) fn service() -> Arc<Service> {
        let factors = FactorTable::from_reader(FACTORS_CSV.as_bytes()).expect("factor csv parses");
        let rating_table: RatingTable = "A:10,B:20,C:35,D:50,E".parse().expect("table parses");
        Arc::new(CarbonIntensityService::new(
            Arc::new(InMemoryReportRepository::default()),
            Arc::new(StampingCertificates),
            Arc::new(factors),
            AssessmentConfig::new(rating_table),
        ))
    }

    pub(super) fn submission(category: &str) -> ReportSubmission {
        ReportSubmission {
            supplier_id: Some(SupplierId("supplier-biofuels-nl".to_string())),
            feedstock_id: Some(FeedstockId(format!("feedstock-{category}"))),
            feedstock_category: Some(category.to_string()),
            methodology: Some(Methodology::RedIi),
            data_quality: Some(DataQuality::Default),
            reporting_period: Some(ReportingPeriod {
                start: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
                end: NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"),
                reference_year: 2025,
            }),
            components: None,
            calculation_notes: None,
            submit: true,
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use carbon_ci::workflows::carbon_intensity::domain::{ActorId, ReportStatus};
use carbon_ci::workflows::carbon_intensity::{
    report_router, ActionKind, ReportServiceError, TransitionError, VerificationAction,
};

use common::*;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

fn post(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[test]
fn default_factor_report_moves_through_review_and_revision() {
    let service = service();
    let auditor = ActorId("auditor-lena".to_string());

    let report = service
        .create(submission("used_cooking_oil"))
        .expect("create succeeds");
    assert_eq!(report.status, ReportStatus::Submitted);
    assert_eq!(report.total_ci_value, 20.0);
    assert_eq!(report.rating.label, "B");
    assert!((report.ghg_savings_percentage - 77.53).abs() < 0.01);
    assert!(report.red_ii_compliant && report.rtfo_compliant && report.cfp_compliant);

    service
        .verify(&report.report_id, VerificationAction::StartReview, auditor.clone())
        .expect("review starts");
    let outcome = service
        .verify(
            &report.report_id,
            VerificationAction::RequestRevision {
                notes: "replace default factors with measured data".to_string(),
            },
            auditor,
        )
        .expect("revision requested");

    assert_eq!(outcome.report.status, ReportStatus::Draft);
    assert_eq!(outcome.report.total_ci_value, 20.0);
    let trail: Vec<(ActionKind, ReportStatus, ReportStatus)> = outcome
        .report
        .audit_log
        .iter()
        .map(|entry| (entry.action, entry.prior_status, entry.new_status))
        .collect();
    assert_eq!(
        trail,
        vec![
            (
                ActionKind::Submit,
                ReportStatus::Draft,
                ReportStatus::Submitted
            ),
            (
                ActionKind::StartReview,
                ReportStatus::Submitted,
                ReportStatus::UnderReview
            ),
            (
                ActionKind::RequestRevision,
                ReportStatus::UnderReview,
                ReportStatus::Draft
            ),
        ]
    );
}

#[test]
fn high_land_use_change_pathway_fails_stricter_schemes() {
    let service = service();

    let report = service
        .create(submission("corn stover"))
        .expect("create succeeds");

    // 19.5 + 8.5 + 18.0 = 46.0 gCO2e/MJ, about 48% savings.
    assert_eq!(report.total_ci_value, 46.0);
    assert_eq!(report.rating.label, "D");
    assert!(!report.red_ii_compliant);
    assert!(!report.rtfo_compliant);
    assert!(!report.cfp_compliant);
}

#[test]
fn rejected_report_is_terminal() {
    let service = service();
    let auditor = ActorId("auditor-lena".to_string());
    let report = service
        .create(submission("used_cooking_oil"))
        .expect("create succeeds");
    service
        .verify(&report.report_id, VerificationAction::StartReview, auditor.clone())
        .expect("review starts");
    service
        .verify(
            &report.report_id,
            VerificationAction::Reject {
                reason: "feedstock origin not traceable".to_string(),
            },
            auditor.clone(),
        )
        .expect("reject succeeds");

    match service.verify(&report.report_id, VerificationAction::Submit, auditor) {
        Err(ReportServiceError::Transition(TransitionError::InvalidTransition {
            from: ReportStatus::Rejected,
            ..
        })) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert!(matches!(
        service.certificate(&report.report_id),
        Err(ReportServiceError::CertificateUnavailable(
            ReportStatus::Rejected
        ))
    ));
}

#[tokio::test]
async fn http_surface_creates_verifies_and_certifies() {
    let router = report_router(service());

    let created = router
        .clone()
        .oneshot(post(
            "/api/v1/ci-reports",
            json!({
                "supplier_id": "supplier-biofuels-nl",
                "feedstock_id": "feedstock-uco-2025",
                "methodology": "iso14067",
                "data_quality": "measured",
                "reporting_period": {
                    "start": "2025-01-01",
                    "end": "2025-12-31",
                    "reference_year": 2025
                },
                "components": {
                    "scope1": { "cultivation": 5, "processing": 3, "transport": 2 },
                    "scope2": { "electricity": 4, "heat": 1 },
                    "scope3": {
                        "upstream_inputs": 2,
                        "land_use_change": 1,
                        "distribution": 1,
                        "end_of_life": 1
                    }
                }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    let report_id = created["report_id"]
        .as_str()
        .expect("report id present")
        .to_string();
    assert_eq!(created["status"], "submitted");

    for payload in [
        json!({ "action": "start_review", "actor_id": "auditor-lena" }),
        json!({ "action": "approve", "actor_id": "auditor-lena", "notes": "invoices match" }),
    ] {
        let response = router
            .clone()
            .oneshot(post(
                &format!("/api/v1/ci-reports/{report_id}/verify"),
                payload,
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(post(
            &format!("/api/v1/ci-reports/{report_id}/verify"),
            json!({ "action": "reject", "actor_id": "auditor-lena", "rejection_reason": "late" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let certificate = router
        .oneshot(
            Request::get(format!("/api/v1/ci-reports/{report_id}/certificate"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(certificate.status(), StatusCode::OK);
    let certificate = json_body(certificate).await;
    assert_eq!(certificate["certificate_number"], format!("CERT-{report_id}"));
    assert_eq!(certificate["total_ci_value"], 20.0);
    assert_eq!(certificate["compliance"]["red_ii_compliant"], true);
}
