//! Canonical feature record consumed by the fitted preprocessor.

use serde::{Deserialize, Serialize};

/// Column names of [`FeatureRecord`], matching the preprocessor's training schema.
pub const FEATURE_COLUMNS: [&str; 12] = [
    "otc_prepain",
    "age",
    "height",
    "weight",
    "gender",
    "race",
    "ethnicity",
    "otc_pain_location",
    "otc_pain_time",
    "otc_cocomt_symptom",
    "otc_sleep",
    "otc_cause",
];

/// One assembled, typed row ready for the preprocessor.
///
/// Field names are part of the model contract and must not be renamed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    /// Pre-treatment pain level (1-10)
    pub otc_prepain: i64,
    pub age: i64,
    /// Height in inches
    pub height: f64,
    /// Weight in pounds
    pub weight: f64,
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
    pub otc_pain_location: String,
    pub otc_pain_time: String,
    /// Selected symptoms joined with `,` (empty when none)
    pub otc_cocomt_symptom: String,
    pub otc_sleep: String,
    pub otc_cause: String,
}

/// A borrowed, typed value of one [`FeatureRecord`] column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
}

impl<'a> FeatureValue<'a> {
    /// Numeric view of the value, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FeatureValue::Text(s) => Some(*s),
            _ => None,
        }
    }
}

impl FeatureRecord {
    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<FeatureValue<'_>> {
        let value = match column {
            "otc_prepain" => FeatureValue::Integer(self.otc_prepain),
            "age" => FeatureValue::Integer(self.age),
            "height" => FeatureValue::Float(self.height),
            "weight" => FeatureValue::Float(self.weight),
            "gender" => FeatureValue::Text(&self.gender),
            "race" => FeatureValue::Text(&self.race),
            "ethnicity" => FeatureValue::Text(&self.ethnicity),
            "otc_pain_location" => FeatureValue::Text(&self.otc_pain_location),
            "otc_pain_time" => FeatureValue::Text(&self.otc_pain_time),
            "otc_cocomt_symptom" => FeatureValue::Text(&self.otc_cocomt_symptom),
            "otc_sleep" => FeatureValue::Text(&self.otc_sleep),
            "otc_cause" => FeatureValue::Text(&self.otc_cause),
            _ => return None,
        };
        Some(value)
    }
}

/// Numeric encoding of a [`FeatureRecord`].
pub type FeatureVector = Vec<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureRecord {
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

    #[test]
    fn test_every_column_resolves() {
        let record = sample();
        for column in FEATURE_COLUMNS {
            assert!(record.get(column).is_some(), "missing column {}", column);
        }
        assert!(record.get("best_otc").is_none());
    }

    #[test]
    fn test_typed_values() {
        let record = sample();
        assert_eq!(record.get("otc_prepain"), Some(FeatureValue::Integer(7)));
        assert_eq!(record.get("height").and_then(|v| v.as_f64()), Some(68.0));
        assert_eq!(record.get("gender").and_then(|v| v.as_text()), Some("Male"));
        assert_eq!(record.get("age").and_then(|v| v.as_text()), None);
    }

    #[test]
    fn test_serialized_keys_match_columns() {
        let json = serde_json::to_value(sample()).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), FEATURE_COLUMNS.len());
        for column in FEATURE_COLUMNS {
            assert!(object.contains_key(column), "missing key {}", column);
        }
    }
}
