use chrono::{DateTime, Utc};
use serde::Serialize;

use super::assessment::{CarbonAssessment, ComplianceFlags, EmissionTotals, Rating};
use super::domain::{
    ActorId, DataQuality, EmissionComponents, FeedstockId, Methodology, ReportDraft, ReportId,
    ReportStatus, ReportingPeriod, SupplierId,
};
use super::lifecycle::{ActionKind, AuditEntryDraft};

/// Stored report: validated draft content, derived values and workflow state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub report_id: ReportId,
    pub draft: ReportDraft,
    pub assessment: CarbonAssessment,
    pub status: ReportStatus,
    pub rejection_reason: Option<String>,
    pub assigned_auditor: Option<ActorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_id: self.report_id.clone(),
            supplier_id: self.draft.supplier_id.clone(),
            status: self.status.label(),
            total_ci_value: self.assessment.totals.total_ci_value(),
            rating: self.assessment.rating.label.clone(),
            assigned_auditor: self.assigned_auditor.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Compact listing row for auditor review queues.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub report_id: ReportId,
    pub supplier_id: SupplierId,
    pub status: &'static str,
    pub total_ci_value: f64,
    pub rating: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_auditor: Option<ActorId>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit row. Sequence numbers are assigned by the store and
/// strictly increase per report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub sequence: u64,
    pub report_id: ReportId,
    pub action: ActionKind,
    pub prior_status: ReportStatus,
    pub new_status: ReportStatus,
    pub actor: ActorId,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Compare-and-swap request: apply `status` and the record changes only if the
/// stored status still equals `expected`, appending `entry` in the same write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub report_id: ReportId,
    pub expected: ReportStatus,
    pub status: ReportStatus,
    pub assigned_auditor: Option<ActorId>,
    pub rejection_reason: Option<String>,
    pub entry: AuditEntryDraft,
}

/// Storage abstraction owning report records and their append-only audit log.
pub trait ReportRepository: Send + Sync {
    fn insert(&self, record: ReportRecord) -> Result<ReportRecord, RepositoryError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, RepositoryError>;
    /// Replace draft content. Fails with `StatusConflict` unless the stored
    /// report is in draft.
    fn replace_draft(&self, record: ReportRecord) -> Result<ReportRecord, RepositoryError>;
    /// Atomically update status and append one audit entry.
    fn commit_transition(
        &self,
        change: StatusChange,
    ) -> Result<(ReportRecord, AuditLogEntry), RepositoryError>;
    /// Audit entries for a report in commit order.
    fn audit_log(&self, id: &ReportId) -> Result<Vec<AuditLogEntry>, RepositoryError>;
    fn by_status(
        &self,
        status: ReportStatus,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("report status changed concurrently (expected {expected}, found {found})")]
    StatusConflict {
        expected: ReportStatus,
        found: ReportStatus,
    },
    #[error("audit trail ends in {replayed} but report is {stored}")]
    AuditTrailMismatch {
        stored: ReportStatus,
        replayed: ReportStatus,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Downloadable artifact for a verified report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    pub certificate_number: String,
    pub report_id: ReportId,
    pub supplier_id: SupplierId,
    pub feedstock_id: FeedstockId,
    pub reporting_period: ReportingPeriod,
    pub total_ci_value: f64,
    pub rating: String,
    pub ghg_savings_percentage: f64,
    pub compliance: ComplianceFlags,
    pub verified_by: ActorId,
    pub verified_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

/// Inputs handed to the external certificate generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRequest {
    pub record: ReportRecord,
    pub verification: AuditLogEntry,
}

/// Outbound hook to the certificate generator collaborator.
pub trait CertificateGenerator: Send + Sync {
    fn issue(&self, request: CertificateRequest) -> Result<Certificate, CertificateError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate generator unavailable: {0}")]
    Transport(String),
}

/// Full report as returned to callers, with derived values and audit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub report_id: ReportId,
    pub supplier_id: SupplierId,
    pub feedstock_id: FeedstockId,
    pub methodology: Methodology,
    pub data_quality: DataQuality,
    pub reporting_period: ReportingPeriod,
    pub components: EmissionComponents,
    pub scope1_total: f64,
    pub scope2_total: f64,
    pub scope3_total: f64,
    pub total_ci_value: f64,
    pub rating: Rating,
    pub ghg_savings_percentage: f64,
    pub red_ii_compliant: bool,
    pub rtfo_compliant: bool,
    pub cfp_compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_notes: Option<String>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_auditor: Option<ActorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub audit_log: Vec<AuditLogEntry>,
}

impl ReportView {
    pub fn new(record: ReportRecord, audit_log: Vec<AuditLogEntry>) -> Self {
        let ReportRecord {
            report_id,
            draft,
            assessment,
            status,
            rejection_reason,
            assigned_auditor,
            created_at,
            updated_at,
        } = record;
        let totals: EmissionTotals = assessment.totals;

        Self {
            report_id,
            supplier_id: draft.supplier_id,
            feedstock_id: draft.feedstock_id,
            methodology: draft.methodology,
            data_quality: draft.data_quality,
            reporting_period: draft.reporting_period,
            components: draft.components,
            scope1_total: totals.scope1_total(),
            scope2_total: totals.scope2_total(),
            scope3_total: totals.scope3_total(),
            total_ci_value: totals.total_ci_value(),
            rating: assessment.rating,
            ghg_savings_percentage: assessment.ghg_savings_percentage,
            red_ii_compliant: assessment.compliance.red_ii_compliant,
            rtfo_compliant: assessment.compliance.rtfo_compliant,
            cfp_compliant: assessment.compliance.cfp_compliant,
            calculation_notes: draft.calculation_notes,
            status,
            rejection_reason,
            assigned_auditor,
            created_at,
            updated_at,
            audit_log,
        }
    }
}
