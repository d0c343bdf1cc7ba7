use serde::Serialize;

use super::super::domain::EmissionComponents;
use super::super::intake::ValidationError;

/// Per-scope totals and the grand carbon-intensity value, gCO2e/MJ.
///
/// Only constructed by [`aggregate`], so the totals always equal the sums of
/// their components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionTotals {
    scope1_total: f64,
    scope2_total: f64,
    scope3_total: f64,
    total_ci_value: f64,
}

impl EmissionTotals {
    pub fn scope1_total(&self) -> f64 {
        self.scope1_total
    }

    pub fn scope2_total(&self) -> f64 {
        self.scope2_total
    }

    pub fn scope3_total(&self) -> f64 {
        self.scope3_total
    }

    pub fn total_ci_value(&self) -> f64 {
        self.total_ci_value
    }
}

/// Reject negative or non-finite components.
pub(crate) fn check_components(components: &EmissionComponents) -> Result<(), ValidationError> {
    for (field, value) in components.named() {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteComponent { field });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeComponent { field, value });
        }
    }
    Ok(())
}

/// Sum the nine components into scope totals and the grand total.
pub fn aggregate(components: &EmissionComponents) -> Result<EmissionTotals, ValidationError> {
    check_components(components)?;

    let s1 = &components.scope1;
    let s2 = &components.scope2;
    let s3 = &components.scope3;

    let scope1_total = s1.cultivation + s1.processing + s1.transport;
    let scope2_total = s2.electricity + s2.heat;
    let scope3_total = s3.upstream_inputs + s3.land_use_change + s3.distribution + s3.end_of_life;
    let total_ci_value = scope1_total + scope2_total + scope3_total;

    // Finite inputs can still overflow to infinity.
    if !total_ci_value.is_finite() {
        return Err(ValidationError::NonFiniteComponent {
            field: "total_ci_value",
        });
    }

    Ok(EmissionTotals {
        scope1_total,
        scope2_total,
        scope3_total,
        total_ci_value,
    })
}
