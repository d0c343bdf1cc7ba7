use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::assessment::{AssessmentConfig, AssessmentEngine, CarbonAssessment};
use super::domain::{
    ActorId, EmissionComponents, ReportId, ReportRevision, ReportStatus, ReportSubmission,
};
use super::factors::EmissionFactorProvider;
use super::intake::{IntakeGuard, ValidationError};
use super::lifecycle::{self, ActionKind, TransitionEffect, TransitionError, VerificationAction};
use super::repository::{
    AuditLogEntry, Certificate, CertificateError, CertificateGenerator, CertificateRequest,
    ReportRecord, ReportRepository, ReportSummary, ReportView, RepositoryError, StatusChange,
};

/// Service composing intake validation, derivation, the state machine and storage.
pub struct CarbonIntensityService<R, C> {
    intake: Arc<IntakeGuard>,
    engine: Arc<AssessmentEngine>,
    repository: Arc<R>,
    certificates: Arc<C>,
}

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_report_id() -> ReportId {
    let id = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("ci-{id:06}"))
}

/// A committed transition: the updated report and the entry it appended.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub report: ReportView,
    pub entry: AuditLogEntry,
}

impl<R, C> CarbonIntensityService<R, C>
where
    R: ReportRepository + 'static,
    C: CertificateGenerator + 'static,
{
    pub fn new(
        repository: Arc<R>,
        certificates: Arc<C>,
        factors: Arc<dyn EmissionFactorProvider>,
        config: AssessmentConfig,
    ) -> Self {
        Self {
            intake: Arc::new(IntakeGuard::new(factors)),
            engine: Arc::new(AssessmentEngine::new(config)),
            repository,
            certificates,
        }
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    /// Validate and store a new report, submitting it when the payload asks to.
    pub fn create(&self, submission: ReportSubmission) -> Result<ReportView, ReportServiceError> {
        let submit = submission.submit;
        let draft = self.intake.draft_from_submission(submission)?;
        let assessment = self.engine.assess(&draft.components)?;
        let now = Utc::now();

        let record = ReportRecord {
            report_id: next_report_id(),
            draft,
            assessment,
            status: ReportStatus::Draft,
            rejection_reason: None,
            assigned_auditor: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(
            report_id = %stored.report_id,
            total_ci_value = stored.assessment.totals.total_ci_value(),
            rating = %stored.assessment.rating.label,
            "carbon-intensity report created"
        );

        if submit {
            let supplier = ActorId(stored.draft.supplier_id.0.clone());
            let outcome = self.verify(&stored.report_id, VerificationAction::Submit, supplier)?;
            return Ok(outcome.report);
        }

        let audit_log = self.repository.audit_log(&stored.report_id)?;
        Ok(ReportView::new(stored, audit_log))
    }

    /// Replace the components of a report that is still (or again) in draft.
    pub fn revise(
        &self,
        report_id: &ReportId,
        revision: ReportRevision,
    ) -> Result<ReportView, ReportServiceError> {
        let record = self
            .repository
            .fetch(report_id)?
            .ok_or(RepositoryError::NotFound)?;
        if !record.status.is_editable() {
            return Err(ReportServiceError::NotEditable(record.status));
        }

        let draft = self.intake.apply_revision(&record.draft, revision)?;
        let assessment = self.engine.assess(&draft.components)?;
        let updated = ReportRecord {
            draft,
            assessment,
            updated_at: Utc::now(),
            ..record
        };

        let stored = match self.repository.replace_draft(updated) {
            Ok(stored) => stored,
            Err(RepositoryError::StatusConflict { found, .. }) => {
                warn!(report_id = %report_id, status = %found, "draft revision lost a race");
                return Err(ReportServiceError::NotEditable(found));
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            report_id = %report_id,
            total_ci_value = stored.assessment.totals.total_ci_value(),
            "draft components revised"
        );
        let audit_log = self.repository.audit_log(report_id)?;
        Ok(ReportView::new(stored, audit_log))
    }

    /// Apply one workflow action under compare-and-swap on the current status.
    pub fn verify(
        &self,
        report_id: &ReportId,
        action: VerificationAction,
        actor: ActorId,
    ) -> Result<TransitionOutcome, ReportServiceError> {
        let record = self
            .repository
            .fetch(report_id)?
            .ok_or(RepositoryError::NotFound)?;
        let kind = action.kind();

        if kind == ActionKind::Submit {
            // Submission re-runs the aggregator; an invalid draft never enters review.
            let fresh = self.engine.assess(&record.draft.components)?;
            self.note_drift(&record, &fresh);
        }

        let transition = match lifecycle::transition(record.status, &action, &actor) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(report_id = %report_id, action = %kind, status = %record.status, %err, "transition refused");
                return Err(err.into());
            }
        };

        let (assigned_auditor, rejection_reason) = match transition.effect {
            TransitionEffect::None => (record.assigned_auditor.clone(), None),
            TransitionEffect::AssignAuditor(auditor) => (Some(auditor), None),
            TransitionEffect::RecordRejection(reason) => {
                (record.assigned_auditor.clone(), Some(reason))
            }
        };

        let change = StatusChange {
            report_id: report_id.clone(),
            expected: transition.from,
            status: transition.to,
            assigned_auditor,
            rejection_reason,
            entry: transition.entry,
        };

        let (stored, entry) = match self.repository.commit_transition(change) {
            Ok(committed) => committed,
            Err(RepositoryError::StatusConflict { expected, found }) => {
                warn!(
                    report_id = %report_id,
                    action = %kind,
                    %expected,
                    %found,
                    "transition lost a concurrent update"
                );
                return Err(TransitionError::InvalidTransition {
                    action: kind,
                    from: found,
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            report_id = %report_id,
            action = %kind,
            from = %entry.prior_status,
            to = %entry.new_status,
            actor = %entry.actor.0,
            sequence = entry.sequence,
            "verification transition committed"
        );

        let audit_log = self.repository.audit_log(report_id)?;
        Ok(TransitionOutcome {
            report: ReportView::new(stored, audit_log),
            entry,
        })
    }

    /// Fetch a report with freshly derived values and its ordered audit history.
    pub fn get(&self, report_id: &ReportId) -> Result<ReportView, ReportServiceError> {
        let (record, audit_log) = self.load_consistent(report_id)?;
        Ok(ReportView::new(record, audit_log))
    }

    /// Issue a certificate for a verified report.
    pub fn certificate(&self, report_id: &ReportId) -> Result<Certificate, ReportServiceError> {
        let (record, audit_log) = self.load_consistent(report_id)?;
        if record.status != ReportStatus::Verified {
            return Err(ReportServiceError::CertificateUnavailable(record.status));
        }

        let verification = audit_log
            .into_iter()
            .rev()
            .find(|entry| entry.action == ActionKind::Approve)
            .ok_or(RepositoryError::AuditTrailMismatch {
                stored: record.status,
                replayed: ReportStatus::Draft,
            })?;

        let certificate = self.certificates.issue(CertificateRequest {
            record,
            verification,
        })?;
        info!(
            report_id = %report_id,
            certificate_number = %certificate.certificate_number,
            "certificate issued"
        );
        Ok(certificate)
    }

    /// Reports waiting in `status`, for auditor queues.
    pub fn queue(
        &self,
        status: ReportStatus,
        limit: usize,
    ) -> Result<Vec<ReportSummary>, ReportServiceError> {
        let records = self.repository.by_status(status, limit)?;
        Ok(records.iter().map(ReportRecord::summary).collect())
    }

    pub fn defaults_for(&self, category: &str) -> Result<EmissionComponents, ReportServiceError> {
        Ok(self.intake.defaults_for(category)?)
    }

    pub fn factor_categories(&self) -> Vec<String> {
        self.intake.factors().categories()
    }

    /// Derive values for components without storing anything.
    pub fn preview(
        &self,
        components: &EmissionComponents,
    ) -> Result<CarbonAssessment, ReportServiceError> {
        Ok(self.engine.assess(components)?)
    }

    /// Load a record, recompute its derived values and check that the audit
    /// trail agrees with its status.
    fn load_consistent(
        &self,
        report_id: &ReportId,
    ) -> Result<(ReportRecord, Vec<AuditLogEntry>), ReportServiceError> {
        let mut record = self
            .repository
            .fetch(report_id)?
            .ok_or(RepositoryError::NotFound)?;

        let fresh = self.engine.assess(&record.draft.components)?;
        self.note_drift(&record, &fresh);
        record.assessment = fresh;

        let audit_log = self.repository.audit_log(report_id)?;
        let replayed = lifecycle::replayed_status(audit_log.iter().map(|entry| entry.new_status));
        if replayed != record.status {
            return Err(RepositoryError::AuditTrailMismatch {
                stored: record.status,
                replayed,
            }
            .into());
        }

        Ok((record, audit_log))
    }

    fn note_drift(&self, record: &ReportRecord, fresh: &CarbonAssessment) {
        if &record.assessment != fresh {
            warn!(
                report_id = %record.report_id,
                stored = record.assessment.totals.total_ci_value(),
                recomputed = fresh.totals.total_ci_value(),
                "stored derived values disagree with recomputation"
            );
        }
    }
}

/// Error raised by the carbon-intensity service.
#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("report is {0} and cannot be edited")]
    NotEditable(ReportStatus),
    #[error("certificate unavailable while report is {0}")]
    CertificateUnavailable(ReportStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

impl ReportServiceError {
    /// Stable machine-readable name for API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Transition(TransitionError::InvalidTransition { .. }) => "invalid_transition",
            Self::Transition(TransitionError::MissingReason) => "missing_reason",
            Self::Transition(TransitionError::MissingNotes) => "missing_notes",
            Self::NotEditable(_) => "not_editable",
            Self::CertificateUnavailable(_) => "certificate_unavailable",
            Self::Repository(RepositoryError::NotFound) => "not_found",
            Self::Repository(_) => "persistence_error",
            Self::Certificate(_) => "certificate_error",
        }
    }
}
