//! Tabular preprocessor: standard scaling plus one-hot encoding.

use serde::{Deserialize, Serialize};

use super::{ArtifactError, ArtifactResult};
use crate::inference::{InferenceError, InferenceResult, Preprocessor};
use crate::models::{ArtifactInfo, FeatureRecord, FeatureVector};

/// A standard-scaled numeric column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    /// Zero is treated as 1 (constant column)
    pub scale: f64,
}

/// A one-hot encoded categorical column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalColumn {
    pub name: String,
    /// Categories in encoding order
    pub categories: Vec<String>,
}

/// Serialized preprocessor document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessorDocument {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

/// Fitted column transformer.
///
/// Output layout: numeric columns in declaration order, then one block per
/// categorical column. A value outside a column's categories encodes as an
/// all-zero block.
#[derive(Debug, Clone)]
pub struct TabularPreprocessor {
    info: ArtifactInfo,
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

impl TabularPreprocessor {
    /// Parse and validate a JSON document.
    pub fn from_slice(bytes: &[u8], sha256: String) -> ArtifactResult<Self> {
        let document: PreprocessorDocument = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::Invalid(format!("preprocessor JSON: {}", e)))?;
        Self::from_document(document, sha256)
    }

    /// Validate a parsed document.
    pub fn from_document(document: PreprocessorDocument, sha256: String) -> ArtifactResult<Self> {
        let mut seen: Vec<&str> = Vec::new();
        let names = document
            .numeric
            .iter()
            .map(|c| c.name.as_str())
            .chain(document.categorical.iter().map(|c| c.name.as_str()));
        for name in names {
            if seen.contains(&name) {
                return Err(ArtifactError::Invalid(format!(
                    "column '{}' declared twice",
                    name
                )));
            }
            seen.push(name);
        }
        if seen.is_empty() {
            return Err(ArtifactError::Invalid("preprocessor declares no columns".into()));
        }

        for column in &document.numeric {
            if !column.mean.is_finite() || !column.scale.is_finite() {
                return Err(ArtifactError::Invalid(format!(
                    "column '{}' has non-finite scaling parameters",
                    column.name
                )));
            }
        }
        for column in &document.categorical {
            if column.categories.is_empty() {
                return Err(ArtifactError::Invalid(format!(
                    "column '{}' has no categories",
                    column.name
                )));
            }
        }

        Ok(Self {
            info: ArtifactInfo {
                id: document.id,
                version: document.version,
                sha256,
            },
            numeric: document.numeric,
            categorical: document.categorical,
        })
    }

    /// Length of every vector this preprocessor produces.
    pub fn output_len(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Input columns the preprocessor reads, numeric first.
    pub fn input_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.categorical.iter().map(|c| c.name.as_str()))
            .collect()
    }
}

impl Preprocessor for TabularPreprocessor {
    fn info(&self) -> &ArtifactInfo {
        &self.info
    }

    fn transform(&self, record: &FeatureRecord) -> InferenceResult<FeatureVector> {
        let mut vector = Vec::with_capacity(self.output_len());

        for column in &self.numeric {
            let value = record
                .get(&column.name)
                .ok_or_else(|| InferenceError::Transform(format!("missing column '{}'", column.name)))?
                .as_f64()
                .ok_or_else(|| {
                    InferenceError::Transform(format!("column '{}' is not numeric", column.name))
                })?;
            if !value.is_finite() {
                return Err(InferenceError::Transform(format!(
                    "column '{}' is not finite",
                    column.name
                )));
            }
            let scale = if column.scale == 0.0 { 1.0 } else { column.scale };
            vector.push((value - column.mean) / scale);
        }

        for column in &self.categorical {
            let value = record
                .get(&column.name)
                .ok_or_else(|| InferenceError::Transform(format!("missing column '{}'", column.name)))?
                .as_text()
                .ok_or_else(|| {
                    InferenceError::Transform(format!("column '{}' is not categorical", column.name))
                })?;
            vector.extend(
                column
                    .categories
                    .iter()
                    .map(|c| if c == value { 1.0 } else { 0.0 }),
            );
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "id": "otc_preprocessor",
        "version": "1",
        "numeric": [
            {"name": "otc_prepain", "mean": 5.0, "scale": 2.0},
            {"name": "age", "mean": 45.0, "scale": 0.0}
        ],
        "categorical": [
            {"name": "gender", "categories": ["Female", "Male"]},
            {"name": "otc_cocomt_symptom", "categories": ["", "Swelling", "Swelling,Stiffness"]}
        ]
    }"#;

    fn record() -> FeatureRecord {
        FeatureRecord {
            otc_prepain: 7,
            age: 45,
            height: 68.0,
            weight: 180.0,
            gender: "Male".into(),
            race: "White".into(),
            ethnicity: "No".into(),
            otc_pain_location: "All over the knee".into(),
            otc_pain_time: "First thing in the morning".into(),
            otc_cocomt_symptom: "Swelling".into(),
            otc_sleep: "None of the above".into(),
            otc_cause: "Aging (osteoarthritis)".into(),
        }
    }

    fn preprocessor() -> TabularPreprocessor {
        TabularPreprocessor::from_slice(DOC.as_bytes(), "ab".repeat(32)).unwrap()
    }

    #[test]
    fn test_transform_layout() {
        let pre = preprocessor();
        assert_eq!(pre.output_len(), 7);

        let vector = pre.transform(&record()).unwrap();
        // (7 - 5) / 2, (45 - 45) / 1, then one-hot blocks
        assert_eq!(vector, vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_all_zero() {
        let mut record = record();
        record.gender = "Prefer not to say".into();
        let vector = preprocessor().transform(&record).unwrap();
        assert_eq!(&vector[2..4], &[0.0, 0.0]);
    }

    #[test]
    fn test_info_from_document() {
        let pre = preprocessor();
        assert_eq!(pre.info().id, "otc_preprocessor");
        assert_eq!(pre.info().version.as_deref(), Some("1"));
        assert_eq!(pre.input_columns(), vec!["otc_prepain", "age", "gender", "otc_cocomt_symptom"]);
    }

    #[test]
    fn test_missing_column_is_transform_error() {
        let doc = r#"{"id": "p", "numeric": [{"name": "bmi", "mean": 0, "scale": 1}]}"#;
        let pre = TabularPreprocessor::from_slice(doc.as_bytes(), String::new()).unwrap();
        let err = pre.transform(&record()).unwrap_err();
        assert_eq!(err, InferenceError::Transform("missing column 'bmi'".into()));
    }

    #[test]
    fn test_wrong_type_is_transform_error() {
        let doc = r#"{"id": "p", "numeric": [{"name": "gender", "mean": 0, "scale": 1}]}"#;
        let pre = TabularPreprocessor::from_slice(doc.as_bytes(), String::new()).unwrap();
        assert!(matches!(
            pre.transform(&record()),
            Err(InferenceError::Transform(_))
        ));

        let doc = r#"{"id": "p", "categorical": [{"name": "age", "categories": ["45"]}]}"#;
        let pre = TabularPreprocessor::from_slice(doc.as_bytes(), String::new()).unwrap();
        assert!(matches!(
            pre.transform(&record()),
            Err(InferenceError::Transform(_))
        ));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mut record = record();
        record.weight = f64::INFINITY;
        let doc = r#"{"id": "p", "numeric": [{"name": "weight", "mean": 0, "scale": 1}]}"#;
        let pre = TabularPreprocessor::from_slice(doc.as_bytes(), String::new()).unwrap();
        assert!(pre.transform(&record).is_err());
    }

    #[test]
    fn test_invalid_documents() {
        let duplicate = r#"{"id": "p",
            "numeric": [{"name": "age", "mean": 0, "scale": 1}],
            "categorical": [{"name": "age", "categories": ["a"]}]}"#;
        assert!(TabularPreprocessor::from_slice(duplicate.as_bytes(), String::new()).is_err());

        let empty = r#"{"id": "p"}"#;
        assert!(TabularPreprocessor::from_slice(empty.as_bytes(), String::new()).is_err());

        let no_categories = r#"{"id": "p", "categorical": [{"name": "race", "categories": []}]}"#;
        assert!(TabularPreprocessor::from_slice(no_categories.as_bytes(), String::new()).is_err());
    }
}
