use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Letter rating derived from a carbon-intensity value.
///
/// `rank` is the position in the table, 0 being the best rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub label: String,
    pub rank: usize,
}

impl Rating {
    /// True when `self` is strictly worse than `other`.
    pub fn is_worse_than(&self, other: &Rating) -> bool {
        self.rank > other.rank
    }
}

/// Upper CI bound (inclusive) for one rating band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBand {
    pub label: String,
    pub max_ci: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingTableError {
    #[error("rating table needs at least one threshold band")]
    Empty,
    #[error("rating label must not be blank")]
    BlankLabel,
    #[error("rating label `{0}` appears more than once")]
    DuplicateLabel(String),
    #[error("threshold for `{label}` must be a finite, non-negative number")]
    InvalidThreshold { label: String },
    #[error("threshold for `{label}` must be greater than the previous band")]
    NotAscending { label: String },
    #[error("malformed rating entry `{0}` (expected LABEL:MAX_CI)")]
    Malformed(String),
}

/// Ordered, monotonic threshold table. Bands are kept in ascending `max_ci`
/// order and a value above every band receives the `worst` rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingTable {
    bands: Vec<RatingBand>,
    worst: String,
}

impl RatingTable {
    pub fn new(bands: Vec<RatingBand>, worst: impl Into<String>) -> Result<Self, RatingTableError> {
        let worst = worst.into().trim().to_string();
        if bands.is_empty() {
            return Err(RatingTableError::Empty);
        }
        if worst.is_empty() {
            return Err(RatingTableError::BlankLabel);
        }

        let mut seen: Vec<&str> = Vec::with_capacity(bands.len() + 1);
        let mut previous: Option<f64> = None;
        for band in &bands {
            let label = band.label.trim();
            if label.is_empty() {
                return Err(RatingTableError::BlankLabel);
            }
            if seen.contains(&label) {
                return Err(RatingTableError::DuplicateLabel(label.to_string()));
            }
            seen.push(label);

            if !band.max_ci.is_finite() || band.max_ci < 0.0 {
                return Err(RatingTableError::InvalidThreshold {
                    label: label.to_string(),
                });
            }
            if let Some(prev) = previous {
                if band.max_ci.partial_cmp(&prev) != Some(Ordering::Greater) {
                    return Err(RatingTableError::NotAscending {
                        label: label.to_string(),
                    });
                }
            }
            previous = Some(band.max_ci);
        }
        if seen.contains(&worst.as_str()) {
            return Err(RatingTableError::DuplicateLabel(worst));
        }

        let bands = bands
            .into_iter()
            .map(|band| RatingBand {
                label: band.label.trim().to_string(),
                max_ci: band.max_ci,
            })
            .collect();

        Ok(Self { bands, worst })
    }

    pub fn bands(&self) -> &[RatingBand] {
        &self.bands
    }

    pub fn worst(&self) -> &str {
        &self.worst
    }

    /// Return the rating of the first band the value does not exceed.
    pub fn classify(&self, total_ci_value: f64) -> Rating {
        self.bands
            .iter()
            .enumerate()
            .find(|(_, band)| total_ci_value <= band.max_ci)
            .map(|(rank, band)| Rating {
                label: band.label.clone(),
                rank,
            })
            .unwrap_or_else(|| Rating {
                label: self.worst.clone(),
                rank: self.bands.len(),
            })
    }
}

/// Parses `A:20,B:40,C` where the trailing bare label is the worst rating.
impl FromStr for RatingTable {
    type Err = RatingTableError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();
        let (worst, thresholds) = entries.split_last().ok_or(RatingTableError::Empty)?;
        if worst.contains(':') {
            return Err(RatingTableError::Malformed((*worst).to_string()));
        }

        let bands = thresholds
            .iter()
            .map(|entry| {
                let (label, max) = entry
                    .split_once(':')
                    .ok_or_else(|| RatingTableError::Malformed((*entry).to_string()))?;
                let max_ci = max
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| RatingTableError::Malformed((*entry).to_string()))?;
                Ok(RatingBand {
                    label: label.trim().to_string(),
                    max_ci,
                })
            })
            .collect::<Result<Vec<_>, RatingTableError>>()?;

        Self::new(bands, *worst)
    }
}
