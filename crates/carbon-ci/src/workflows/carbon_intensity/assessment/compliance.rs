use serde::{Deserialize, Serialize};

/// Fossil-fuel comparator used when no override is configured, gCO2e/MJ.
pub const DEFAULT_FOSSIL_BASELINE: f64 = 89.0;

/// Regulatory schemes with an independent minimum GHG-savings threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryScheme {
    RedIi,
    Rtfo,
    Cfp,
}

impl RegulatoryScheme {
    pub const fn ordered() -> [Self; 3] {
        [Self::RedIi, Self::Rtfo, Self::Cfp]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RedIi => "RED II",
            Self::Rtfo => "RTFO",
            Self::Cfp => "CFP",
        }
    }

    /// Minimum GHG savings, percent.
    pub const fn minimum_savings(self) -> f64 {
        match self {
            Self::RedIi => 65.0,
            Self::Rtfo => 60.0,
            Self::Cfp => 50.0,
        }
    }
}

/// One flag per scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComplianceFlags {
    pub red_ii_compliant: bool,
    pub rtfo_compliant: bool,
    pub cfp_compliant: bool,
}

impl ComplianceFlags {
    pub fn get(&self, scheme: RegulatoryScheme) -> bool {
        match scheme {
            RegulatoryScheme::RedIi => self.red_ii_compliant,
            RegulatoryScheme::Rtfo => self.rtfo_compliant,
            RegulatoryScheme::Cfp => self.cfp_compliant,
        }
    }

    pub fn satisfied(&self) -> Vec<RegulatoryScheme> {
        RegulatoryScheme::ordered()
            .into_iter()
            .filter(|scheme| self.get(*scheme))
            .collect()
    }
}

/// Savings percentage against the comparator, plus the scheme flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceOutcome {
    pub ghg_savings_percentage: f64,
    pub flags: ComplianceFlags,
}

/// `(baseline - ci) / baseline * 100`. Negative when the pathway emits more
/// than the fossil comparator.
pub fn ghg_savings_percentage(baseline: f64, total_ci_value: f64) -> f64 {
    (baseline - total_ci_value) / baseline * 100.0
}

pub fn evaluate(baseline: f64, total_ci_value: f64) -> ComplianceOutcome {
    let savings = ghg_savings_percentage(baseline, total_ci_value);
    let meets = |scheme: RegulatoryScheme| savings >= scheme.minimum_savings();

    ComplianceOutcome {
        ghg_savings_percentage: savings,
        flags: ComplianceFlags {
            red_ii_compliant: meets(RegulatoryScheme::RedIi),
            rtfo_compliant: meets(RegulatoryScheme::Rtfo),
            cfp_compliant: meets(RegulatoryScheme::Cfp),
        },
    }
}
