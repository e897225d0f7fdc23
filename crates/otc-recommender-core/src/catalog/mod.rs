//! Option catalog: legal categorical values derived from historical records.
//!
//! Built once at startup and read-only afterwards.

mod dataset;
mod form;
mod labels;

pub use dataset::*;
pub use form::*;
pub use labels::*;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog errors. All are fatal at initialization.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Dataset is missing expected columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Columns the dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "best_otc",
    "otc_sleep",
    "otc_cause",
    "otc_pain_location",
    "otc_pain_time",
    "otc_cocomt_symptom",
    "gender",
    "age",
    "height",
    "weight",
    "ethnicity",
    "race",
];

/// Categorical form fields backed by catalog options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    Gender,
    Race,
    Ethnicity,
    PainLocation,
    PainTime,
    Symptom,
    Sleep,
    Cause,
}

impl CatalogField {
    pub const ALL: [CatalogField; 8] = [
        CatalogField::Gender,
        CatalogField::Race,
        CatalogField::Ethnicity,
        CatalogField::PainLocation,
        CatalogField::PainTime,
        CatalogField::Symptom,
        CatalogField::Sleep,
        CatalogField::Cause,
    ];

    /// Dataset column holding this field.
    pub fn column(&self) -> &'static str {
        match self {
            CatalogField::Gender => "gender",
            CatalogField::Race => "race",
            CatalogField::Ethnicity => "ethnicity",
            CatalogField::PainLocation => "otc_pain_location",
            CatalogField::PainTime => "otc_pain_time",
            CatalogField::Symptom => "otc_cocomt_symptom",
            CatalogField::Sleep => "otc_sleep",
            CatalogField::Cause => "otc_cause",
        }
    }

    /// Parse a form field name or dataset column key.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|f| {
            f.column() == name
                || match f {
                    CatalogField::PainLocation => name == "pain_location",
                    CatalogField::PainTime => name == "pain_time",
                    CatalogField::Symptom => name == "symptoms" || name == "symptom",
                    CatalogField::Sleep => name == "sleep",
                    CatalogField::Cause => name == "cause",
                    _ => false,
                }
        })
    }
}

/// Whether a cell is a survey artifact rather than an answer.
pub fn is_non_answer(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.to_lowercase().contains("selected choice")
        || trimmed.ends_with('?')
        || is_question_text(trimmed)
}

/// Distinct answers observed for `field`, in first-seen order.
///
/// Symptom cells hold comma-joined selections and are split first.
pub fn build_category_options(
    dataset: &HistoricalDataset,
    field: CatalogField,
) -> CatalogResult<Vec<String>> {
    let mut options: Vec<String> = Vec::new();
    for cell in dataset.column(field.column())? {
        let values: Vec<&str> = if field == CatalogField::Symptom {
            cell.split(',').collect()
        } else {
            vec![cell]
        };
        for value in values {
            let value = value.trim();
            if is_non_answer(value) || options.iter().any(|o| o == value) {
                continue;
            }
            options.push(value.to_string());
        }
    }
    Ok(options)
}

/// Count target labels and mark those below `min_count` as [`OTHER_LABEL`].
pub fn collapse_rare_labels(
    dataset: &HistoricalDataset,
    min_count: usize,
) -> CatalogResult<LabelSummary> {
    Ok(LabelSummary::from_labels(
        dataset.column(LABEL_COLUMN)?,
        min_count,
    ))
}

/// Immutable option catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionCatalog {
    options: HashMap<CatalogField, Vec<String>>,
    labels: LabelSummary,
    record_count: usize,
}

impl OptionCatalog {
    /// Build from a dataset; fails if any required column is missing.
    pub fn from_dataset(dataset: &HistoricalDataset, min_label_count: usize) -> CatalogResult<Self> {
        dataset.require_columns(&REQUIRED_COLUMNS)?;

        let mut options = HashMap::new();
        for field in CatalogField::ALL {
            options.insert(field, build_category_options(dataset, field)?);
        }
        let labels = collapse_rare_labels(dataset, min_label_count)?;

        tracing::info!(
            records = dataset.len(),
            classes = labels.classes().len(),
            collapsed = labels.collapsed().len(),
            "Built option catalog"
        );

        Ok(Self {
            options,
            labels,
            record_count: dataset.len(),
        })
    }

    /// Read a CSV dataset and build the catalog.
    pub fn from_path<P: AsRef<Path>>(path: P, min_label_count: usize) -> CatalogResult<Self> {
        let dataset = HistoricalDataset::from_path(path)?;
        Self::from_dataset(&dataset, min_label_count)
    }

    /// Observed answers for a field.
    pub fn options(&self, field: CatalogField) -> &[String] {
        self.options.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a value was observed (or is a fixed form answer) for a field.
    ///
    /// Advisory only: unknown values are still passed to the preprocessor.
    pub fn is_known(&self, field: CatalogField, value: &str) -> bool {
        let value = value.trim();
        self.options(field).iter().any(|o| o == value)
            || form_options(field).is_some_and(|fixed| fixed.contains(&value))
    }

    /// Dropdown choices: fixed answers when the form defines them, else observed values.
    pub fn choices(&self, field: CatalogField) -> Vec<String> {
        match form_options(field) {
            Some(fixed) => fixed.iter().map(|s| s.to_string()).collect(),
            None => self.options(field).to_vec(),
        }
    }

    /// Target label summary.
    pub fn labels(&self) -> &LabelSummary {
        &self.labels
    }

    /// Number of records the catalog was built from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Best OTC,OTCSleep,OTC Cause,OTC PainLocation,OTC PainTime,OTC CocomtSymptom,Gender,Age,Height,Weight,Ethnicity,Race
Naproxen,None of the above,Aging (osteoarthritis),All over the knee,First thing in the morning,\"Swelling,Stiffness\",Male,45,68,180,No,White
Naproxen,Abnormal sleep pattern,Overweight or obesity,In the front of your knee,When unwell,Swelling,Female,52,64,150,Yes,Black
Ibuprofen,None of the above,Aging (osteoarthritis),All over the knee,During bad weather,,Male,61,70,200,No,White
X,What caused your knee pain? - Selected Choice,Aging (osteoarthritis),All over the knee,When unwell,Fever,Gender,33,66,170,No,Asian
";

    fn dataset() -> HistoricalDataset {
        HistoricalDataset::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_options_first_seen_and_distinct() {
        let options = build_category_options(&dataset(), CatalogField::Race).unwrap();
        assert_eq!(options, vec!["White", "Black", "Asian"]);
    }

    #[test]
    fn test_non_answers_excluded() {
        let sleep = build_category_options(&dataset(), CatalogField::Sleep).unwrap();
        assert_eq!(sleep, vec!["None of the above", "Abnormal sleep pattern"]);

        let gender = build_category_options(&dataset(), CatalogField::Gender).unwrap();
        assert_eq!(gender, vec!["Male", "Female"]);
    }

    #[test]
    fn test_symptoms_split() {
        let symptoms = build_category_options(&dataset(), CatalogField::Symptom).unwrap();
        assert_eq!(symptoms, vec!["Swelling", "Stiffness", "Fever"]);
    }

    #[test]
    fn test_options_reproducible() {
        let a = OptionCatalog::from_dataset(&dataset(), 5).unwrap();
        let b = OptionCatalog::from_dataset(&dataset(), 5).unwrap();
        for field in CatalogField::ALL {
            assert_eq!(a.options(field), b.options(field));
        }
    }

    #[test]
    fn test_catalog_schema_mismatch() {
        let dataset = HistoricalDataset::from_reader("Best OTC,Gender\nNaproxen,Male\n".as_bytes()).unwrap();
        let err = OptionCatalog::from_dataset(&dataset, 5).unwrap_err();

        match err {
            CatalogError::SchemaMismatch { missing } => {
                assert_eq!(missing.len(), 10);
                assert!(missing.contains(&"otc_sleep".to_string()));
                assert!(!missing.contains(&"gender".to_string()));
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_labels() {
        let catalog = OptionCatalog::from_dataset(&dataset(), 2).unwrap();
        assert_eq!(catalog.record_count(), 4);
        assert_eq!(catalog.labels().collapsed_label("Naproxen"), "Naproxen");
        assert_eq!(catalog.labels().collapsed_label("Ibuprofen"), "Other");
        assert_eq!(catalog.labels().collapsed_label("X"), "Other");
    }

    #[test]
    fn test_is_known_and_choices() {
        let catalog = OptionCatalog::from_dataset(&dataset(), 5).unwrap();

        assert!(catalog.is_known(CatalogField::Race, "Black"));
        assert!(!catalog.is_known(CatalogField::Race, "Martian"));
        // Fixed answers count even if never observed
        assert!(catalog.is_known(CatalogField::Cause, "Repeated stress (overuse)"));

        assert_eq!(catalog.choices(CatalogField::Sleep).len(), SLEEP_OPTIONS.len());
        assert_eq!(catalog.choices(CatalogField::Gender), vec!["Male", "Female"]);
    }

    #[test]
    fn test_field_parse() {
        assert_eq!(CatalogField::parse("gender"), Some(CatalogField::Gender));
        assert_eq!(CatalogField::parse("pain_location"), Some(CatalogField::PainLocation));
        assert_eq!(CatalogField::parse("otc_cocomt_symptom"), Some(CatalogField::Symptom));
        assert_eq!(CatalogField::parse("symptoms"), Some(CatalogField::Symptom));
        assert_eq!(CatalogField::parse("best_otc"), None);
    }
}
