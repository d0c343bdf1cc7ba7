use std::sync::Arc;

use chrono::NaiveDate;

use super::assessment::aggregation::check_components;
use super::domain::{EmissionComponents, ReportDraft, ReportRevision, ReportSubmission};
use super::factors::EmissionFactorProvider;

/// Validation errors raised before any derived computation or persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("component `{field}` must be non-negative (found {value})")]
    NegativeComponent { field: &'static str, value: f64 },
    #[error("component `{field}` must be a finite number")]
    NonFiniteComponent { field: &'static str },
    #[error("reporting period ends ({end}) before it starts ({start})")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("reference year {year} falls outside the reporting period")]
    ReferenceYearOutsidePeriod { year: i32 },
    #[error("no default emission factors for feedstock category `{0}`")]
    UnknownFeedstockCategory(String),
}

/// Guard responsible for turning wizard submissions into immutable drafts.
#[derive(Clone)]
pub struct IntakeGuard {
    factors: Arc<dyn EmissionFactorProvider>,
}

impl std::fmt::Debug for IntakeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeGuard").finish_non_exhaustive()
    }
}

impl IntakeGuard {
    pub fn new(factors: Arc<dyn EmissionFactorProvider>) -> Self {
        Self { factors }
    }

    pub fn factors(&self) -> &dyn EmissionFactorProvider {
        self.factors.as_ref()
    }

    /// Validate a submission once, at the boundary.
    ///
    /// Components supplied by the caller win over the category defaults; a
    /// submission naming neither is rejected.
    pub fn draft_from_submission(
        &self,
        submission: ReportSubmission,
    ) -> Result<ReportDraft, ValidationError> {
        let supplier_id = submission
            .supplier_id
            .filter(|id| !id.0.trim().is_empty())
            .ok_or(ValidationError::MissingField("supplier_id"))?;
        let feedstock_id = submission
            .feedstock_id
            .filter(|id| !id.0.trim().is_empty())
            .ok_or(ValidationError::MissingField("feedstock_id"))?;
        let methodology = submission
            .methodology
            .ok_or(ValidationError::MissingField("methodology"))?;
        let data_quality = submission
            .data_quality
            .ok_or(ValidationError::MissingField("data_quality"))?;
        let reporting_period = submission
            .reporting_period
            .ok_or(ValidationError::MissingField("reporting_period"))?;

        if reporting_period.end < reporting_period.start {
            return Err(ValidationError::InvalidPeriod {
                start: reporting_period.start,
                end: reporting_period.end,
            });
        }
        let first_year = chrono::Datelike::year(&reporting_period.start);
        let last_year = chrono::Datelike::year(&reporting_period.end);
        if reporting_period.reference_year < first_year
            || reporting_period.reference_year > last_year
        {
            return Err(ValidationError::ReferenceYearOutsidePeriod {
                year: reporting_period.reference_year,
            });
        }

        let components = match (submission.components, submission.feedstock_category) {
            (Some(components), _) => components,
            (None, Some(category)) => self
                .factors
                .defaults_for(&category)
                .ok_or(ValidationError::UnknownFeedstockCategory(category))?,
            (None, None) => return Err(ValidationError::MissingField("components")),
        };
        check_components(&components)?;

        Ok(ReportDraft {
            supplier_id,
            feedstock_id,
            methodology,
            data_quality,
            reporting_period,
            components,
            calculation_notes: normalize_notes(submission.calculation_notes),
        })
    }

    /// Apply replacement components to an existing draft.
    pub fn apply_revision(
        &self,
        draft: &ReportDraft,
        revision: ReportRevision,
    ) -> Result<ReportDraft, ValidationError> {
        check_components(&revision.components)?;
        let calculation_notes =
            normalize_notes(revision.calculation_notes).or_else(|| draft.calculation_notes.clone());

        Ok(ReportDraft {
            components: revision.components,
            calculation_notes,
            ..draft.clone()
        })
    }

    pub fn defaults_for(&self, category: &str) -> Result<EmissionComponents, ValidationError> {
        self.factors
            .defaults_for(category)
            .ok_or_else(|| ValidationError::UnknownFeedstockCategory(category.to_string()))
    }
}

/// Trim free text, collapsing blank strings to `None`.
pub(crate) fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
