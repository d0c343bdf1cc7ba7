use crate::infra::{
    load_factor_table, parse_fossil_baseline, parse_rating_table, LocalCertificateGenerator,
};
use carbon_ci::config::{AppConfig, ConfigError};
use carbon_ci::error::AppError;
use carbon_ci::workflows::carbon_intensity::{
    ActorId, AssessmentConfig, CarbonAssessment, CarbonIntensityService, DataQuality,
    EmissionComponents, FactorTable, FeedstockId, InMemoryReportRepository, Methodology,
    RatingTable, RegulatoryScheme, ReportRevision, ReportServiceError, ReportSubmission,
    ReportView, ReportingPeriod, Scope1Inputs, Scope2Inputs, Scope3Inputs, SupplierId, VerificationAction,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Start from the default factors of this feedstock category
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Default emission factor CSV (overrides CI_DEFAULT_FACTORS_CSV)
    #[arg(long)]
    pub(crate) factors_csv: Option<PathBuf>,
    #[arg(long)]
    pub(crate) cultivation: Option<f64>,
    #[arg(long)]
    pub(crate) processing: Option<f64>,
    #[arg(long)]
    pub(crate) transport: Option<f64>,
    #[arg(long)]
    pub(crate) electricity: Option<f64>,
    #[arg(long)]
    pub(crate) heat: Option<f64>,
    #[arg(long)]
    pub(crate) upstream_inputs: Option<f64>,
    #[arg(long)]
    pub(crate) land_use_change: Option<f64>,
    #[arg(long)]
    pub(crate) distribution: Option<f64>,
    #[arg(long)]
    pub(crate) end_of_life: Option<f64>,
    /// Rating thresholds such as "A:10,B:20,C" (overrides CI_RATING_THRESHOLDS)
    #[arg(long, value_parser = parse_rating_table)]
    pub(crate) thresholds: Option<RatingTable>,
    /// Fossil comparator in gCO2e/MJ (overrides CI_FOSSIL_BASELINE)
    #[arg(long, value_parser = parse_fossil_baseline)]
    pub(crate) baseline: Option<f64>,
    /// Print the assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl AssessArgs {
    fn apply_overrides(&self, components: &mut EmissionComponents) {
        let overrides = [
            (self.cultivation, &mut components.scope1.cultivation),
            (self.processing, &mut components.scope1.processing),
            (self.transport, &mut components.scope1.transport),
            (self.electricity, &mut components.scope2.electricity),
            (self.heat, &mut components.scope2.heat),
            (self.upstream_inputs, &mut components.scope3.upstream_inputs),
            (self.land_use_change, &mut components.scope3.land_use_change),
            (self.distribution, &mut components.scope3.distribution),
            (self.end_of_life, &mut components.scope3.end_of_life),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Rating thresholds used for the sample report
    #[arg(long, value_parser = parse_rating_table, default_value = "A:10,B:20,C:35,D:50,E")]
    pub(crate) thresholds: RatingTable,
    /// Fossil comparator in gCO2e/MJ
    #[arg(long, value_parser = parse_fossil_baseline)]
    pub(crate) baseline: Option<f64>,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rating_table = args
        .thresholds
        .clone()
        .or_else(|| config.reporting.rating_table.clone())
        .ok_or(ConfigError::MissingRatingThresholds)?;
    let baseline = args.baseline.unwrap_or(config.reporting.fossil_baseline);
    let factors_path = args
        .factors_csv
        .clone()
        .or_else(|| config.reporting.default_factors_csv.clone());
    let factors = load_factor_table(factors_path.as_deref())?;

    let service = CarbonIntensityService::new(
        Arc::new(InMemoryReportRepository::default()),
        Arc::new(LocalCertificateGenerator::default()),
        Arc::new(factors),
        AssessmentConfig::new(rating_table)
            .with_fossil_baseline(baseline)
            .map_err(|_| ConfigError::InvalidBaseline)?,
    );

    let mut components = match args.category.as_deref() {
        Some(category) => service.defaults_for(category)?,
        None => EmissionComponents::default(),
    };
    args.apply_overrides(&mut components);

    let assessment = service.preview(&components)?;
    if args.json {
        match serde_json::to_string_pretty(&assessment) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Assessment payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_assessment(&assessment, baseline);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        thresholds,
        baseline,
    } = args;

    let mut config = AssessmentConfig::new(thresholds);
    if let Some(baseline) = baseline {
        config = config
            .with_fossil_baseline(baseline)
            .map_err(|_| ConfigError::InvalidBaseline)?;
    }
    let fossil_baseline = config.fossil_baseline;

    let factors = FactorTable::from_entries([("used_cooking_oil", sample_components())])?;
    let certificates = Arc::new(LocalCertificateGenerator::default());
    let service = CarbonIntensityService::new(
        Arc::new(InMemoryReportRepository::default()),
        certificates.clone(),
        Arc::new(factors),
        config,
    );

    let supplier = ActorId("supplier-demo".to_string());
    let auditor = ActorId("auditor-demo".to_string());

    println!("Carbon-intensity verification demo");
    let report = service.create(demo_submission())?;
    println!(
        "- Created {} from `used_cooking_oil` defaults -> status {}",
        report.report_id, report.status
    );
    render_assessment_view(&report, fossil_baseline);

    let report_id = report.report_id;
    service.verify(&report_id, VerificationAction::StartReview, auditor.clone())?;
    let outcome = service.verify(
        &report_id,
        VerificationAction::RequestRevision {
            notes: "Replace default electricity factor with metered data".to_string(),
        },
        auditor.clone(),
    )?;
    println!(
        "\nAuditor requested a revision -> status {}",
        outcome.report.status
    );

    let mut revised = outcome.report.components;
    revised.scope2.electricity = 2.5;
    let report = service.revise(
        &report_id,
        ReportRevision {
            components: revised,
            calculation_notes: Some("Metered electricity, Q1-Q4".to_string()),
        },
    )?;
    println!(
        "Supplier revised components -> total {:.2} gCO2e/MJ (rating {})",
        report.total_ci_value, report.rating.label
    );

    service.verify(&report_id, VerificationAction::Submit, supplier)?;
    service.verify(&report_id, VerificationAction::StartReview, auditor.clone())?;
    let outcome = service.verify(
        &report_id,
        VerificationAction::Approve {
            notes: Some("Metering evidence reconciled".to_string()),
        },
        auditor,
    )?;
    println!("Auditor approved -> status {}", outcome.report.status);

    println!("\nAudit trail");
    for entry in &outcome.report.audit_log {
        let notes = entry
            .notes
            .as_deref()
            .map(|notes| format!(" | {notes}"))
            .unwrap_or_default();
        println!(
            "  #{} {} {} -> {} by {}{}",
            entry.sequence,
            entry.action,
            entry.prior_status,
            entry.new_status,
            entry.actor.0,
            notes
        );
    }

    let certificate = service.certificate(&report_id)?;
    println!(
        "\nCertificate {} issued for {} ({:.2} gCO2e/MJ, rating {}, verified by {})",
        certificate.certificate_number,
        certificate.report_id,
        certificate.total_ci_value,
        certificate.rating,
        certificate.verified_by.0
    );
    let issued = certificates.issued().map_err(ReportServiceError::from)?;
    println!("Certificates issued this run: {issued}");

    Ok(())
}

fn render_assessment(assessment: &CarbonAssessment, baseline: f64) {
    let totals = &assessment.totals;
    println!(
        "Scope totals: S1 {:.2} | S2 {:.2} | S3 {:.2} gCO2e/MJ",
        totals.scope1_total(),
        totals.scope2_total(),
        totals.scope3_total()
    );
    println!(
        "Total carbon intensity: {:.2} gCO2e/MJ (rating {})",
        totals.total_ci_value(),
        assessment.rating.label
    );
    println!(
        "GHG savings vs {:.1} gCO2e/MJ comparator: {:.1}%",
        baseline, assessment.ghg_savings_percentage
    );
    for scheme in RegulatoryScheme::ordered() {
        let verdict = if assessment.compliance.get(scheme) {
            "compliant"
        } else {
            "not compliant"
        };
        println!(
            "- {} (>= {:.0}% savings): {}",
            scheme.label(),
            scheme.minimum_savings(),
            verdict
        );
    }
}

fn render_assessment_view(report: &ReportView, baseline: f64) {
    println!(
        "  Totals S1 {:.2} | S2 {:.2} | S3 {:.2} => {:.2} gCO2e/MJ, rating {}",
        report.scope1_total,
        report.scope2_total,
        report.scope3_total,
        report.total_ci_value,
        report.rating.label
    );
    println!(
        "  Savings vs {:.1}: {:.1}% | RED II {} | RTFO {} | CFP {}",
        baseline,
        report.ghg_savings_percentage,
        report.red_ii_compliant,
        report.rtfo_compliant,
        report.cfp_compliant
    );
}

fn sample_components() -> EmissionComponents {
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

fn demo_submission() -> ReportSubmission {
    let year = Local::now().year();
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(start);

    ReportSubmission {
        supplier_id: Some(SupplierId("supplier-demo".to_string())),
        feedstock_id: Some(FeedstockId("feedstock-uco-demo".to_string())),
        feedstock_category: Some("used_cooking_oil".to_string()),
        methodology: Some(Methodology::RedIi),
        data_quality: Some(DataQuality::Default),
        reporting_period: Some(ReportingPeriod {
            start,
            end,
            reference_year: year,
        }),
        components: None,
        calculation_notes: None,
        submit: true,
    }
}
