//! Patient form input models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw knee-pain profile as submitted by the form, before validation.
///
/// Scalar fields hold whatever the user typed or selected; an empty string
/// means "not answered".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientInput {
    /// Age in years (free text, must parse as an integer)
    pub age: String,
    /// Weight in pounds (free text, must parse as a float)
    pub weight: String,
    /// Height in inches (free text, must parse as a float)
    pub height: String,
    /// Current pain level, 1 = low, 10 = high (free text, integer)
    pub pain_level: String,
    pub gender: String,
    pub race: String,
    /// Hispanic origin/ethnicity answer
    pub ethnicity: String,
    pub pain_location: String,
    pub pain_time: String,
    pub sleep: String,
    pub cause: String,
    /// Accompanying symptoms in the order the user selected them
    pub symptoms: Vec<String>,
}

impl PatientInput {
    /// Raw value of a scalar field.
    pub fn field(&self, field: InputField) -> &str {
        match field {
            InputField::Age => &self.age,
            InputField::Gender => &self.gender,
            InputField::Race => &self.race,
            InputField::Ethnicity => &self.ethnicity,
            InputField::Weight => &self.weight,
            InputField::Height => &self.height,
            InputField::PainLevel => &self.pain_level,
            InputField::PainLocation => &self.pain_location,
            InputField::PainTime => &self.pain_time,
            InputField::Sleep => &self.sleep,
            InputField::Cause => &self.cause,
        }
    }
}

/// Required scalar fields of [`PatientInput`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Age,
    Gender,
    Race,
    Ethnicity,
    Weight,
    Height,
    PainLevel,
    PainLocation,
    PainTime,
    Sleep,
    Cause,
}

impl InputField {
    /// Required fields in the order they are checked.
    pub const REQUIRED: [InputField; 11] = [
        InputField::Age,
        InputField::Gender,
        InputField::Race,
        InputField::Ethnicity,
        InputField::Weight,
        InputField::Height,
        InputField::PainLevel,
        InputField::PainLocation,
        InputField::PainTime,
        InputField::Sleep,
        InputField::Cause,
    ];

    /// Field name as it appears in [`PatientInput`].
    pub fn name(&self) -> &'static str {
        match self {
            InputField::Age => "age",
            InputField::Gender => "gender",
            InputField::Race => "race",
            InputField::Ethnicity => "ethnicity",
            InputField::Weight => "weight",
            InputField::Height => "height",
            InputField::PainLevel => "pain_level",
            InputField::PainLocation => "pain_location",
            InputField::PainTime => "pain_time",
            InputField::Sleep => "sleep",
            InputField::Cause => "cause",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let input = PatientInput {
            age: "45".into(),
            pain_level: "7".into(),
            cause: "Aging (osteoarthritis)".into(),
            ..Default::default()
        };

        assert_eq!(input.field(InputField::Age), "45");
        assert_eq!(input.field(InputField::PainLevel), "7");
        assert_eq!(input.field(InputField::Cause), "Aging (osteoarthritis)");
        assert_eq!(input.field(InputField::Race), "");
    }

    #[test]
    fn test_deserialize_partial_json() {
        // Hosts may omit unanswered questions entirely
        let json = r#"{"age":"45","symptoms":["Swelling"]}"#;
        let input: PatientInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.age, "45");
        assert_eq!(input.gender, "");
        assert_eq!(input.symptoms, vec!["Swelling".to_string()]);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(InputField::PainLevel.to_string(), "pain_level");
        assert_eq!(InputField::REQUIRED[0], InputField::Age);
        assert_eq!(InputField::REQUIRED.len(), 11);
    }
}
