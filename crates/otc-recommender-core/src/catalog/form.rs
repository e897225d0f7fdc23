//! Fixed questionnaire answer lists.
//!
//! Demographic dropdowns are derived from the historical dataset; the pain
//! context questions use these fixed answers.

use super::CatalogField;

pub const PAIN_LOCATION_OPTIONS: [&str; 6] = [
    "In the front of your knee",
    "All over the knee",
    "Close to the surface above or behind your knee",
    "Deeper inside your knee",
    "In multiple parts of your knee or leg",
    "None of the above",
];

pub const PAIN_TIME_OPTIONS: [&str; 7] = [
    "When moving or bending (better with rest)",
    "First thing in the morning",
    "More pain at night after activity",
    "During bad weather",
    "When stressed/anxious/tired",
    "When unwell",
    "None of the above",
];

pub const SYMPTOM_OPTIONS: [&str; 15] = [
    "Dull pain",
    "Throbbing pain",
    "Sharp pain",
    "Swelling",
    "Stiffness",
    "Redness and warmth",
    "Instability or weakness",
    "Popping or crunching noises",
    "Limited range of motion",
    "Locking of the knee joint",
    "Inability to bear weight",
    "Fever",
    "Disabling pain",
    "Others",
    "None",
];

pub const SLEEP_OPTIONS: [&str; 3] = [
    "Abnormal sleep pattern",
    "Pain at other joint(s)",
    "None of the above",
];

pub const CAUSE_OPTIONS: [&str; 8] = [
    "Overweight or obesity",
    "Injuries (ligaments/cartilage/bone fractures)",
    "Medical conditions (arthritis, gout, infections, tendonitis, bursitis)",
    "Aging (osteoarthritis)",
    "Repeated stress (overuse)",
    "Other conditions (patellofemoral syndrome, lupus, rheumatoid arthritis)",
    "None of the above",
    "Don’t know",
];

/// Question texts of the form. Survey exports sometimes leak these into answer cells.
pub const QUESTION_TEXTS: [&str; 11] = [
    "Age",
    "Gender",
    "Race",
    "Hispanic Origin/Ethnicity",
    "Weight (lbs)",
    "Height (inches)",
    "Current pain level (1 = low, 10 = high)",
    "Where do you feel your knee pain?",
    "When do you feel pain?",
    "Accompanying symptoms",
    "Do you experience any of these?",
];

/// Cause question, kept apart so it can be matched as a prefix.
pub const CAUSE_QUESTION: &str = "What caused your knee pain?";

/// Fixed answers for a field, or `None` for dataset-derived fields.
pub fn form_options(field: CatalogField) -> Option<&'static [&'static str]> {
    match field {
        CatalogField::PainLocation => Some(&PAIN_LOCATION_OPTIONS),
        CatalogField::PainTime => Some(&PAIN_TIME_OPTIONS),
        CatalogField::Symptom => Some(&SYMPTOM_OPTIONS),
        CatalogField::Sleep => Some(&SLEEP_OPTIONS),
        CatalogField::Cause => Some(&CAUSE_OPTIONS),
        CatalogField::Gender | CatalogField::Race | CatalogField::Ethnicity => None,
    }
}

/// Whether a cell value restates a question instead of answering it.
pub fn is_question_text(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    QUESTION_TEXTS
        .iter()
        .chain(std::iter::once(&CAUSE_QUESTION))
        .map(|q| q.to_lowercase())
        .any(|q| value == q || (q.ends_with('?') && value.starts_with(&q)))
}
