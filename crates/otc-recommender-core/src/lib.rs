//! OTC Recommender Core Library
//!
//! Ranked over-the-counter treatment recommendations for knee pain, computed
//! from a patient's form answers with a pre-trained classifier.
//!
//! # Architecture
//!
//! ```text
//!                     Form answers (PatientInput)
//!                                 │
//!                     ┌───────────▼───────────┐
//!                     │   Feature Assembler   │  validate → parse → map
//!                     └───────────┬───────────┘
//!                                 │ FeatureRecord
//!                     ┌───────────▼───────────┐
//!                     │   Inference Engine    │  preprocessor → classifier
//!                     └───────────┬───────────┘
//!                                 │ ClassProbability × K
//!                     ┌───────────▼───────────┐
//!                     │        Ranker         │  top-K, deterministic ties
//!                     └───────────┬───────────┘
//!                                 │
//!                           Recommendation
//!
//!      [ArtifactStore: preprocessor + classifier + option catalog,
//!       loaded once per process, shared read-only]
//! ```
//!
//! # Core Principle
//!
//! **Incomplete input never reaches the model.** Missing or malformed answers
//! are rejected before any transform or prediction runs.
//!
//! # Modules
//!
//! - [`assembler`]: Input validation and feature record assembly
//! - [`catalog`]: Option catalog derived from the historical dataset
//! - [`inference`]: Preprocessor/classifier traits and the inference engine
//! - [`ranker`]: Top-K selection
//! - [`artifacts`]: Model artifact loading and the process-wide store
//! - [`pipeline`]: End-to-end recommendation
//! - [`config`]: Configuration file and environment overrides

pub mod artifacts;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod ranker;

// Re-export commonly used types
pub use artifacts::{global_store, ArtifactStore, LoadedArtifacts};
pub use assembler::FeatureAssembler;
pub use catalog::{CatalogField, OptionCatalog};
pub use config::RecommenderConfig;
pub use inference::{Classifier, InferenceEngine, Preprocessor};
pub use models::{
    ArtifactInfo, ClassProbability, FeatureRecord, InputField, PatientInput, Recommendation,
};
pub use pipeline::Recommender;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum OtcError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid number: {0}")]
    NumericParse(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Unable to compute recommendation: {0}")]
    Transform(String),

    #[error("Unable to compute recommendation: {0}")]
    Inference(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recommender not initialized: {0}")]
    NotInitialized(String),
}

impl From<assembler::AssemblyError> for OtcError {
    fn from(e: assembler::AssemblyError) -> Self {
        match e {
            assembler::AssemblyError::MissingField(field) => {
                OtcError::MissingField(field.name().to_string())
            }
            assembler::AssemblyError::NumericParse { .. } => OtcError::NumericParse(e.to_string()),
        }
    }
}

impl From<inference::InferenceError> for OtcError {
    fn from(e: inference::InferenceError) -> Self {
        match e {
            inference::InferenceError::Transform(_) => OtcError::Transform(e.to_string()),
            inference::InferenceError::Classifier(_) => OtcError::Inference(e.to_string()),
        }
    }
}

impl From<ranker::RankError> for OtcError {
    fn from(e: ranker::RankError) -> Self {
        OtcError::InvalidArgument(e.to_string())
    }
}

impl From<pipeline::PipelineError> for OtcError {
    fn from(e: pipeline::PipelineError) -> Self {
        match e {
            pipeline::PipelineError::Assembly(e) => e.into(),
            pipeline::PipelineError::Inference(e) => e.into(),
            pipeline::PipelineError::Rank(e) => e.into(),
        }
    }
}

impl From<catalog::CatalogError> for OtcError {
    fn from(e: catalog::CatalogError) -> Self {
        OtcError::SchemaMismatch(e.to_string())
    }
}

impl From<artifacts::ArtifactError> for OtcError {
    fn from(e: artifacts::ArtifactError) -> Self {
        OtcError::ArtifactUnavailable(e.to_string())
    }
}

impl From<artifacts::LoadError> for OtcError {
    fn from(e: artifacts::LoadError) -> Self {
        match e {
            artifacts::LoadError::Artifact(e) => e.into(),
            artifacts::LoadError::Catalog(e) => e.into(),
        }
    }
}

impl From<config::ConfigError> for OtcError {
    fn from(e: config::ConfigError) -> Self {
        OtcError::Config(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Load configuration and artifacts, then open the recommender.
///
/// `config_path` is a JSON config file; `None` uses defaults. `OTC_*`
/// environment variables override both. Artifacts live in the process-wide
/// store and are shared by every recommender opened in this process.
#[uniffi::export]
pub fn open_recommender(config_path: Option<String>) -> Result<Arc<OtcRecommenderCore>, OtcError> {
    let config = RecommenderConfig::load(config_path.as_deref().map(Path::new))?;
    OtcRecommenderCore::with_store(config, global_store())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe recommender handle for FFI.
#[derive(uniffi::Object)]
pub struct OtcRecommenderCore {
    config: RecommenderConfig,
    store: Arc<ArtifactStore>,
}

impl OtcRecommenderCore {
    /// Open against a specific store, loading artifacts if it is empty.
    pub fn with_store(
        config: RecommenderConfig,
        store: Arc<ArtifactStore>,
    ) -> Result<Arc<Self>, OtcError> {
        store.get_or_init(|| LoadedArtifacts::load(&config))?;
        Ok(Arc::new(Self { config, store }))
    }

    /// Loaded artifacts. Empty only if the store was invalidated elsewhere.
    fn loaded(&self) -> Result<Arc<LoadedArtifacts>, OtcError> {
        self.store
            .current()
            .ok_or_else(|| OtcError::NotInitialized("artifacts are not loaded".into()))
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }
}

#[uniffi::export]
impl OtcRecommenderCore {
    // =========================================================================
    // Recommendation
    // =========================================================================

    /// Recommend the configured number of treatments for one submission.
    pub fn recommend(&self, input: FfiPatientInput) -> Result<FfiRecommendation, OtcError> {
        let loaded = self.loaded()?;
        let recommender = Recommender::from_loaded(&loaded).with_top_k(self.config.top_k);
        let recommendation = recommender.recommend(&input.into())?;
        Ok(recommendation.into())
    }

    /// Classifier class labels in model order.
    pub fn class_labels(&self) -> Result<Vec<String>, OtcError> {
        Ok(self.loaded()?.engine.class_labels().to_vec())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Distinct answers observed in the historical dataset for a field.
    pub fn category_options(&self, field: String) -> Result<Vec<String>, OtcError> {
        let field = parse_field(&field)?;
        Ok(self.loaded()?.catalog.options(field).to_vec())
    }

    /// Dropdown choices for a form field.
    pub fn form_options(&self, field: String) -> Result<Vec<String>, OtcError> {
        let field = parse_field(&field)?;
        Ok(self.loaded()?.catalog.choices(field))
    }

    /// Reported label for a raw dataset label ("Other" when rare).
    pub fn collapsed_label(&self, label: String) -> Result<String, OtcError> {
        let loaded = self.loaded()?;
        Ok(loaded.catalog.labels().collapsed_label(label.trim()).to_string())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load artifacts again and swap them in.
    ///
    /// Requests keep using the previous set until the new one is ready. On
    /// failure the previous set stays in place.
    pub fn reload(&self) -> Result<(), OtcError> {
        self.store.reload(|| LoadedArtifacts::load(&self.config))?;
        Ok(())
    }
}

fn parse_field(name: &str) -> Result<CatalogField, OtcError> {
    CatalogField::parse(name)
        .ok_or_else(|| OtcError::InvalidArgument(format!("unknown form field: {}", name)))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient input.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientInput {
    pub age: String,
    pub weight: String,
    pub height: String,
    pub pain_level: String,
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
    pub pain_location: String,
    pub pain_time: String,
    pub sleep: String,
    pub cause: String,
    pub symptoms: Vec<String>,
}

impl From<FfiPatientInput> for PatientInput {
    fn from(input: FfiPatientInput) -> Self {
        PatientInput {
            age: input.age,
            weight: input.weight,
            height: input.height,
            pain_level: input.pain_level,
            gender: input.gender,
            race: input.race,
            ethnicity: input.ethnicity,
            pain_location: input.pain_location,
            pain_time: input.pain_time,
            sleep: input.sleep,
            cause: input.cause,
            symptoms: input.symptoms,
        }
    }
}

/// FFI-safe class probability.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClassProbability {
    pub class_index: u32,
    pub label: String,
    pub probability: f64,
    pub display_line: String,
}

impl From<ClassProbability> for FfiClassProbability {
    fn from(p: ClassProbability) -> Self {
        Self {
            display_line: p.display_line(),
            class_index: p.class_index as u32,
            label: p.label,
            probability: p.probability,
        }
    }
}

/// FFI-safe recommendation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecommendation {
    pub submission_id: String,
    pub entries: Vec<FfiClassProbability>,
    pub preprocessor_version: String,
    pub classifier_version: String,
    pub generated_at: String,
}

impl From<Recommendation> for FfiRecommendation {
    fn from(rec: Recommendation) -> Self {
        Self {
            submission_id: rec.submission_id,
            entries: rec.entries.into_iter().map(|e| e.into()).collect(),
            preprocessor_version: rec.preprocessor.label(),
            classifier_version: rec.classifier.label(),
            generated_at: rec.generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InputField;

    #[test]
    fn test_assembly_errors_map_to_kinds() {
        let missing: OtcError = assembler::AssemblyError::MissingField(InputField::PainLevel).into();
        assert!(matches!(missing, OtcError::MissingField(ref f) if f == "pain_level"));

        let numeric: OtcError = pipeline::PipelineError::Assembly(assembler::AssemblyError::NumericParse {
            field: InputField::Age,
            value: "abc".into(),
            reason: "not an integer".into(),
        })
        .into();
        assert!(matches!(numeric, OtcError::NumericParse(_)));
    }

    #[test]
    fn test_inference_errors_map_to_kinds() {
        let transform: OtcError = inference::InferenceError::Transform("x".into()).into();
        assert!(matches!(transform, OtcError::Transform(_)));

        let classifier: OtcError = inference::InferenceError::Classifier("x".into()).into();
        assert!(matches!(classifier, OtcError::Inference(_)));
        assert!(classifier.to_string().starts_with("Unable to compute recommendation"));
    }

    #[test]
    fn test_load_errors_map_to_kinds() {
        let artifact: OtcError =
            artifacts::LoadError::Artifact(artifacts::ArtifactError::Invalid("bad".into())).into();
        assert!(matches!(artifact, OtcError::ArtifactUnavailable(_)));

        let catalog: OtcError = artifacts::LoadError::Catalog(catalog::CatalogError::SchemaMismatch {
            missing: vec!["best_otc".into()],
        })
        .into();
        assert!(matches!(catalog, OtcError::SchemaMismatch(ref m) if m.contains("best_otc")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(parse_field("favorite_color"), Err(OtcError::InvalidArgument(_))));
        assert_eq!(parse_field("sleep").unwrap(), CatalogField::Sleep);
    }

    #[test]
    fn test_ffi_probability_display() {
        let ffi: FfiClassProbability = ClassProbability::new(2, "Naproxen", 0.412).into();
        assert_eq!(ffi.class_index, 2);
        assert_eq!(ffi.display_line, "Naproxen: 41.2% confidence");
    }
}
