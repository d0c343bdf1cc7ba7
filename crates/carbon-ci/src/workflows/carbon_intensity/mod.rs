//! Carbon-intensity reporting and verification.
//!
//! Drafts are validated once at intake, derived values (scope totals, rating,
//! GHG savings, scheme flags) are recomputed from components on every write
//! and read, and status changes go through the verification state machine
//! with one audit entry per committed transition.

pub mod assessment;
pub mod domain;
pub mod factors;
pub mod intake;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assessment::{
    AssessmentConfig, AssessmentEngine, CarbonAssessment, ComplianceFlags, EmissionTotals,
    InvalidFossilBaseline, Rating, RatingBand, RatingTable, RatingTableError, RegulatoryScheme,
    DEFAULT_FOSSIL_BASELINE,
};
pub use domain::{
    ActorId, DataQuality, EmissionComponents, FeedstockId, Methodology, ReportDraft, ReportId,
    ReportRevision, ReportStatus, ReportSubmission, ReportingPeriod, Scope1Inputs, Scope2Inputs,
    Scope3Inputs, SupplierId,
};
pub use factors::{EmissionFactorProvider, FactorTable, FactorTableError};
pub use intake::ValidationError;
pub use lifecycle::{ActionKind, TransitionError, VerificationAction};
pub use memory::InMemoryReportRepository;
pub use repository::{
    AuditLogEntry, Certificate, CertificateError, CertificateGenerator, CertificateRequest,
    ReportRecord, ReportRepository, ReportSummary, ReportView, RepositoryError, StatusChange,
};
pub use router::report_router;
pub use service::{CarbonIntensityService, ReportServiceError, TransitionOutcome};
