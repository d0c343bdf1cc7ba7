use super::compliance::DEFAULT_FOSSIL_BASELINE;
use super::rating::RatingTable;

/// Injectable inputs to the derivation: the comparator and the rating table.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    pub fossil_baseline: f64,
    pub rating_table: RatingTable,
}

impl AssessmentConfig {
    pub fn new(rating_table: RatingTable) -> Self {
        Self {
            fossil_baseline: DEFAULT_FOSSIL_BASELINE,
            rating_table,
        }
    }

    pub fn with_fossil_baseline(mut self, baseline: f64) -> Result<Self, InvalidFossilBaseline> {
        if !baseline.is_finite() || baseline <= 0.0 {
            return Err(InvalidFossilBaseline(baseline));
        }
        self.fossil_baseline = baseline;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("fossil baseline must be a positive, finite gCO2e/MJ value (got {0})")]
pub struct InvalidFossilBaseline(pub f64);
