use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for carbon-intensity reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the supplier that owns a report (managed outside this engine).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

/// Reference to the feedstock a report certifies (managed outside this engine).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedstockId(pub String);

/// Acting user on a workflow transition, either a supplier or an auditor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Accounting methodology the supplier declares for the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    GhgProtocol,
    Iso14064,
    Iso14067,
    RedIi,
}

impl Methodology {
    pub const fn label(self) -> &'static str {
        match self {
            Self::GhgProtocol => "GHG Protocol",
            Self::Iso14064 => "ISO 14064",
            Self::Iso14067 => "ISO 14067",
            Self::RedIi => "RED II",
        }
    }
}

/// Provenance of the emission inputs, from primary measurement down to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Measured,
    Calculated,
    Estimated,
    Default,
}

impl DataQuality {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Measured => "Primary (measured)",
            Self::Calculated => "Secondary (calculated)",
            Self::Estimated => "Estimated",
            Self::Default => "Default values",
        }
    }
}

/// Window the emission inputs were collected over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reference_year: i32,
}

/// Direct emissions, gCO2e/MJ.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope1Inputs {
    pub cultivation: f64,
    pub processing: f64,
    pub transport: f64,
}

/// Purchased-energy emissions, gCO2e/MJ.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope2Inputs {
    pub electricity: f64,
    pub heat: f64,
}

/// Value-chain emissions, gCO2e/MJ.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope3Inputs {
    pub upstream_inputs: f64,
    pub land_use_change: f64,
    pub distribution: f64,
    pub end_of_life: f64,
}

/// The nine scope components a report is calculated from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmissionComponents {
    pub scope1: Scope1Inputs,
    pub scope2: Scope2Inputs,
    pub scope3: Scope3Inputs,
}

impl EmissionComponents {
    /// Every component paired with its wire name, scope 1 first.
    pub fn named(&self) -> [(&'static str, f64); 9] {
        [
            ("scope1.cultivation", self.scope1.cultivation),
            ("scope1.processing", self.scope1.processing),
            ("scope1.transport", self.scope1.transport),
            ("scope2.electricity", self.scope2.electricity),
            ("scope2.heat", self.scope2.heat),
            ("scope3.upstream_inputs", self.scope3.upstream_inputs),
            ("scope3.land_use_change", self.scope3.land_use_change),
            ("scope3.distribution", self.scope3.distribution),
            ("scope3.end_of_life", self.scope3.end_of_life),
        ]
    }
}

/// Supplier payload as received from the reporting wizard; every field is optional
/// until the intake boundary has validated it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSubmission {
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub feedstock_id: Option<FeedstockId>,
    /// Category used to pre-populate components from the default factor table.
    #[serde(default)]
    pub feedstock_category: Option<String>,
    #[serde(default)]
    pub methodology: Option<Methodology>,
    #[serde(default)]
    pub data_quality: Option<DataQuality>,
    #[serde(default)]
    pub reporting_period: Option<ReportingPeriod>,
    #[serde(default)]
    pub components: Option<EmissionComponents>,
    #[serde(default)]
    pub calculation_notes: Option<String>,
    /// Submit for review immediately after creation.
    #[serde(default = "default_submit")]
    pub submit: bool,
}

fn default_submit() -> bool {
    true
}

/// Immutable, validated report content. Only produced by the intake guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub supplier_id: SupplierId,
    pub feedstock_id: FeedstockId,
    pub methodology: Methodology,
    pub data_quality: DataQuality,
    pub reporting_period: ReportingPeriod,
    pub components: EmissionComponents,
    pub calculation_notes: Option<String>,
}

/// Replacement components for a report sitting in draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRevision {
    pub components: EmissionComponents,
    #[serde(default)]
    pub calculation_notes: Option<String>,
}

/// Lifecycle status tracked by the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    Submitted,
    UnderReview,
    Verified,
    Rejected,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
