pub mod aggregation;
pub mod compliance;
mod config;
pub mod rating;

pub use aggregation::{aggregate, EmissionTotals};
pub use compliance::{ComplianceFlags, RegulatoryScheme, DEFAULT_FOSSIL_BASELINE};
pub use config::{AssessmentConfig, InvalidFossilBaseline};
pub use rating::{Rating, RatingBand, RatingTable, RatingTableError};

use serde::Serialize;

use super::domain::EmissionComponents;
use super::intake::ValidationError;

/// Stateless engine deriving totals, rating and compliance from components.
#[derive(Debug, Clone)]
pub struct AssessmentEngine {
    config: AssessmentConfig,
}

impl AssessmentEngine {
    pub fn new(config: AssessmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn assess(
        &self,
        components: &EmissionComponents,
    ) -> Result<CarbonAssessment, ValidationError> {
        let totals = aggregate(components)?;
        let rating = self.config.rating_table.classify(totals.total_ci_value());
        let outcome = compliance::evaluate(self.config.fossil_baseline, totals.total_ci_value());

        Ok(CarbonAssessment {
            totals,
            rating,
            ghg_savings_percentage: outcome.ghg_savings_percentage,
            compliance: outcome.flags,
        })
    }
}

/// Every value derived from a report's components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonAssessment {
    pub totals: EmissionTotals,
    pub rating: Rating,
    pub ghg_savings_percentage: f64,
    pub compliance: ComplianceFlags,
}
