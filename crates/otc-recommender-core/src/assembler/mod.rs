//! Feature assembly for patient form input.
//!
//! Pipeline: validate (completeness) → parse numerics → map into [`FeatureRecord`]

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::models::{FeatureRecord, InputField, PatientInput};

/// Valid pain levels (1 = low, 10 = high).
pub const PAIN_LEVEL_RANGE: RangeInclusive<i64> = 1..=10;

/// Separator used when joining selected symptoms.
pub const SYMPTOM_SEPARATOR: &str = ",";

/// Assembly errors. Both kinds are user-correctable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("Missing required field: {0}")]
    MissingField(InputField),

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    NumericParse {
        field: InputField,
        value: String,
        reason: String,
    },
}

impl AssemblyError {
    /// The input field the error refers to.
    pub fn field(&self) -> InputField {
        match self {
            AssemblyError::MissingField(field) => *field,
            AssemblyError::NumericParse { field, .. } => *field,
        }
    }
}

pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Parsed numeric fields of a [`PatientInput`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericFields {
    pub age: i64,
    pub weight: f64,
    pub height: f64,
    pub pain_level: i64,
}

/// Validates raw input and builds [`FeatureRecord`]s. Stateless and pure.
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Check every required scalar field is answered.
    ///
    /// Fields are checked in [`InputField::REQUIRED`] order and the first blank
    /// one is reported. Symptoms may be empty.
    pub fn validate(&self, input: &PatientInput) -> AssemblyResult<()> {
        match InputField::REQUIRED
            .iter()
            .find(|field| input.field(**field).trim().is_empty())
        {
            Some(field) => Err(AssemblyError::MissingField(*field)),
            None => Ok(()),
        }
    }

    /// Parse the numeric fields.
    pub fn parse_numeric(&self, input: &PatientInput) -> AssemblyResult<NumericFields> {
        let age = parse_integer(input, InputField::Age)?;
        let weight = parse_float(input, InputField::Weight)?;
        let height = parse_float(input, InputField::Height)?;
        let pain_level = parse_integer(input, InputField::PainLevel)?;

        if !PAIN_LEVEL_RANGE.contains(&pain_level) {
            return Err(AssemblyError::NumericParse {
                field: InputField::PainLevel,
                value: input.pain_level.clone(),
                reason: format!(
                    "must be between {} and {}",
                    PAIN_LEVEL_RANGE.start(),
                    PAIN_LEVEL_RANGE.end()
                ),
            });
        }

        Ok(NumericFields {
            age,
            weight,
            height,
            pain_level,
        })
    }

    /// Validate, parse and map the input into a [`FeatureRecord`].
    pub fn assemble(&self, input: &PatientInput) -> AssemblyResult<FeatureRecord> {
        self.validate(input)?;
        let numeric = self.parse_numeric(input)?;

        Ok(FeatureRecord {
            otc_prepain: numeric.pain_level,
            age: numeric.age,
            height: numeric.height,
            weight: numeric.weight,
            gender: input.gender.clone(),
            race: input.race.clone(),
            ethnicity: input.ethnicity.clone(),
            otc_pain_location: input.pain_location.clone(),
            otc_pain_time: input.pain_time.clone(),
            otc_cocomt_symptom: join_symptoms(&input.symptoms),
            otc_sleep: input.sleep.clone(),
            otc_cause: input.cause.clone(),
        })
    }
}

/// Join symptoms in selection order; blank selections are dropped.
pub fn join_symptoms(symptoms: &[String]) -> String {
    symptoms
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(SYMPTOM_SEPARATOR)
}

fn parse_integer(input: &PatientInput, field: InputField) -> AssemblyResult<i64> {
    let raw = input.field(field);
    raw.trim()
        .parse::<i64>()
        .map_err(|e| AssemblyError::NumericParse {
            field,
            value: raw.to_string(),
            reason: format!("expected a whole number: {}", e),
        })
}

fn parse_float(input: &PatientInput, field: InputField) -> AssemblyResult<f64> {
    let raw = input.field(field);
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| AssemblyError::NumericParse {
            field,
            value: raw.to_string(),
            reason: format!("expected a number: {}", e),
        })?;

    if !value.is_finite() {
        return Err(AssemblyError::NumericParse {
            field,
            value: raw.to_string(),
            reason: "expected a finite number".into(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete_input() -> PatientInput {
        PatientInput {
            age: "45".into(),
            weight: "180".into(),
            height: "68".into(),
            pain_level: "7".into(),
            gender: "Male".into(),
            race: "White".into(),
            ethnicity: "No".into(),
            pain_location: "All over the knee".into(),
            pain_time: "First thing in the morning".into(),
            sleep: "None of the above".into(),
            cause: "Aging (osteoarthritis)".into(),
            symptoms: vec!["Swelling".into()],
        }
    }

    fn clear(input: &mut PatientInput, field: InputField) {
        let slot = match field {
            InputField::Age => &mut input.age,
            InputField::Gender => &mut input.gender,
            InputField::Race => &mut input.race,
            InputField::Ethnicity => &mut input.ethnicity,
            InputField::Weight => &mut input.weight,
            InputField::Height => &mut input.height,
            InputField::PainLevel => &mut input.pain_level,
            InputField::PainLocation => &mut input.pain_location,
            InputField::PainTime => &mut input.pain_time,
            InputField::Sleep => &mut input.sleep,
            InputField::Cause => &mut input.cause,
        };
        slot.clear();
    }

    #[test]
    fn test_assemble_complete_input() {
        let record = FeatureAssembler::new().assemble(&complete_input()).unwrap();

        assert_eq!(record.otc_prepain, 7);
        assert_eq!(record.age, 45);
        assert_eq!(record.weight, 180.0);
        assert_eq!(record.height, 68.0);
        assert_eq!(record.gender, "Male");
        assert_eq!(record.otc_pain_location, "All over the knee");
        assert_eq!(record.otc_pain_time, "First thing in the morning");
        assert_eq!(record.otc_cocomt_symptom, "Swelling");
        assert_eq!(record.otc_sleep, "None of the above");
        assert_eq!(record.otc_cause, "Aging (osteoarthritis)");
    }

    #[test]
    fn test_each_required_field_reported() {
        let assembler = FeatureAssembler::new();
        for field in InputField::REQUIRED {
            let mut input = complete_input();
            clear(&mut input, field);
            assert_eq!(
                assembler.validate(&input),
                Err(AssemblyError::MissingField(field)),
                "field {}",
                field
            );
        }
    }

    #[test]
    fn test_first_missing_field_wins() {
        let mut input = complete_input();
        input.cause.clear();
        input.age.clear();

        let err = FeatureAssembler::new().assemble(&input).unwrap_err();
        assert_eq!(err, AssemblyError::MissingField(InputField::Age));
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut input = complete_input();
        input.race = "   ".into();

        let err = FeatureAssembler::new().validate(&input).unwrap_err();
        assert_eq!(err.field(), InputField::Race);
    }

    #[test]
    fn test_empty_symptoms_allowed() {
        let mut input = complete_input();
        input.symptoms.clear();

        let record = FeatureAssembler::new().assemble(&input).unwrap();
        assert_eq!(record.otc_cocomt_symptom, "");
    }

    #[test]
    fn test_symptoms_joined_in_selection_order() {
        let mut input = complete_input();
        input.symptoms = vec!["Swelling".into(), "Stiffness".into()];

        let record = FeatureAssembler::new().assemble(&input).unwrap();
        assert_eq!(record.otc_cocomt_symptom, "Swelling,Stiffness");

        input.symptoms = vec!["Stiffness".into(), "Swelling".into()];
        let record = FeatureAssembler::new().assemble(&input).unwrap();
        assert_eq!(record.otc_cocomt_symptom, "Stiffness,Swelling");
    }

    #[test]
    fn test_blank_symptom_selection_dropped() {
        let symptoms = vec!["".to_string(), "Swelling".to_string(), " ".to_string()];
        assert_eq!(join_symptoms(&symptoms), "Swelling");
    }

    #[test]
    fn test_numeric_fields_trimmed() {
        let mut input = complete_input();
        input.age = " 45 ".into();
        input.weight = "180.5\n".into();

        let numeric = FeatureAssembler::new().parse_numeric(&input).unwrap();
        assert_eq!(numeric.age, 45);
        assert_eq!(numeric.weight, 180.5);
    }

    #[test]
    fn test_fractional_age_rejected() {
        let mut input = complete_input();
        input.age = "45.5".into();

        let err = FeatureAssembler::new().assemble(&input).unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::NumericParse {
                field: InputField::Age,
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_weight_rejected() {
        let mut input = complete_input();
        input.weight = "heavy".into();

        let err = FeatureAssembler::new().assemble(&input).unwrap_err();
        match err {
            AssemblyError::NumericParse { field, value, .. } => {
                assert_eq!(field, InputField::Weight);
                assert_eq!(value, "heavy");
            }
            other => panic!("expected NumericParse, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_height_rejected() {
        let mut input = complete_input();
        input.height = "inf".into();

        let err = FeatureAssembler::new().assemble(&input).unwrap_err();
        assert_eq!(err.field(), InputField::Height);
    }

    #[test]
    fn test_pain_level_range() {
        let assembler = FeatureAssembler::new();
        for (raw, ok) in [("0", false), ("1", true), ("10", true), ("11", false), ("-3", false)] {
            let mut input = complete_input();
            input.pain_level = raw.into();
            assert_eq!(assembler.parse_numeric(&input).is_ok(), ok, "pain level {}", raw);
        }
    }

    proptest! {
        #[test]
        fn prop_non_numeric_age_never_assembles(age in "[a-zA-Z]{1,8}") {
            let mut input = complete_input();
            input.age = age;
            let err = FeatureAssembler::new().assemble(&input).unwrap_err();
            prop_assert_eq!(err.field(), InputField::Age);
        }

        #[test]
        fn prop_valid_numbers_round_trip(
            age in 0i64..120,
            weight in 50.0f64..500.0,
            height in 40.0f64..90.0,
            pain in 1i64..=10,
        ) {
            let mut input = complete_input();
            input.age = age.to_string();
            input.weight = weight.to_string();
            input.height = height.to_string();
            input.pain_level = pain.to_string();

            let record = FeatureAssembler::new().assemble(&input).unwrap();
            prop_assert_eq!(record.age, age);
            prop_assert_eq!(record.weight, weight);
            prop_assert_eq!(record.height, height);
            prop_assert_eq!(record.otc_prepain, pain);
        }

        #[test]
        fn prop_symptom_join_preserves_order(symptoms in proptest::collection::vec("[A-Za-z ]{0,12}", 0..6)) {
            let joined = join_symptoms(&symptoms);
            let expected: Vec<&str> = symptoms
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(String::as_str)
                .collect();
            prop_assert_eq!(joined, expected.join(","));
        }
    }
}
