use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::assessment::aggregation::check_components;
use super::domain::{EmissionComponents, Scope1Inputs, Scope2Inputs, Scope3Inputs};
use super::intake::ValidationError;

/// Category-keyed lookup of baseline emission factors used to pre-populate drafts.
pub trait EmissionFactorProvider: Send + Sync {
    fn defaults_for(&self, category: &str) -> Option<EmissionComponents>;
    fn categories(&self) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum FactorTableError {
    #[error("unable to open factor table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed factor table: {0}")]
    Csv(#[from] csv::Error),
    #[error("factor row `{category}` is invalid: {source}")]
    InvalidRow {
        category: String,
        source: ValidationError,
    },
    #[error("feedstock category `{0}` appears more than once")]
    DuplicateCategory(String),
}

#[derive(Debug, Deserialize)]
struct FactorRow {
    category: String,
    s1_cultivation: f64,
    s1_processing: f64,
    s1_transport: f64,
    s2_electricity: f64,
    s2_heat: f64,
    s3_upstream_inputs: f64,
    s3_land_use_change: f64,
    s3_distribution: f64,
    s3_end_of_life: f64,
}

impl FactorRow {
    fn components(&self) -> EmissionComponents {
        EmissionComponents {
            scope1: Scope1Inputs {
                cultivation: self.s1_cultivation,
                processing: self.s1_processing,
                transport: self.s1_transport,
            },
            scope2: Scope2Inputs {
                electricity: self.s2_electricity,
                heat: self.s2_heat,
            },
            scope3: Scope3Inputs {
                upstream_inputs: self.s3_upstream_inputs,
                land_use_change: self.s3_land_use_change,
                distribution: self.s3_distribution,
                end_of_life: self.s3_end_of_life,
            },
        }
    }
}

/// Static factor table keyed by normalized feedstock category.
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    entries: BTreeMap<String, EmissionComponents>,
}

impl FactorTable {
    pub fn from_entries<I, S>(entries: I) -> Result<Self, FactorTableError>
    where
        I: IntoIterator<Item = (S, EmissionComponents)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (category, components) in entries {
            table.insert(category.as_ref(), components)?;
        }
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FactorTableError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FactorTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = Self::default();
        for row in csv_reader.deserialize::<FactorRow>() {
            let row = row?;
            table.insert(&row.category, row.components())?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(
        &mut self,
        category: &str,
        components: EmissionComponents,
    ) -> Result<(), FactorTableError> {
        let key = normalize_category(category);
        check_components(&components).map_err(|source| FactorTableError::InvalidRow {
            category: key.clone(),
            source,
        })?;
        if self.entries.insert(key.clone(), components).is_some() {
            return Err(FactorTableError::DuplicateCategory(key));
        }
        Ok(())
    }
}

impl EmissionFactorProvider for FactorTable {
    fn defaults_for(&self, category: &str) -> Option<EmissionComponents> {
        self.entries.get(&normalize_category(category)).copied()
    }

    fn categories(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "category,s1_cultivation,s1_processing,s1_transport,s2_electricity,s2_heat,s3_upstream_inputs,s3_land_use_change,s3_distribution,s3_end_of_life\n\
        Used Cooking Oil, 0, 3.5, 1.2, 2.0, 0.5, 1.0, 0, 0.8, 0.1\n\
        wheat-straw, 4.1, 6.0, 2.2, 3.0, 1.5, 2.5, 0, 1.0, 0.2\n";

    #[test]
    fn loads_rows_and_normalizes_categories() {
        let table = FactorTable::from_reader(TABLE.as_bytes()).expect("table parses");
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.categories(),
            vec!["used_cooking_oil".to_string(), "wheat_straw".to_string()]
        );

        let uco = table
            .defaults_for("used cooking oil")
            .expect("category resolves");
        assert_eq!(uco.scope1.processing, 3.5);
        assert_eq!(uco.scope3.end_of_life, 0.1);
        assert!(table.defaults_for("palm oil").is_none());
    }

    #[test]
    fn rejects_negative_factor_rows() {
        let raw = "category,s1_cultivation,s1_processing,s1_transport,s2_electricity,s2_heat,s3_upstream_inputs,s3_land_use_change,s3_distribution,s3_end_of_life\n\
            tallow,1,1,1,1,1,1,-3,1,1\n";

        match FactorTable::from_reader(raw.as_bytes()) {
            Err(FactorTableError::InvalidRow { category, source }) => {
                assert_eq!(category, "tallow");
                assert!(matches!(
                    source,
                    ValidationError::NegativeComponent {
                        field: "scope3.land_use_change",
                        ..
                    }
                ));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_categories() {
        let result = FactorTable::from_entries([
            ("Tallow", EmissionComponents::default()),
            ("tallow", EmissionComponents::default()),
        ]);
        assert!(matches!(
            result,
            Err(FactorTableError::DuplicateCategory(category)) if category == "tallow"
        ));
    }
}
