//! End-to-end recommendation for one form submission.
//!
//! validate → assemble → transform → predict → rank. Validation failures stop
//! before the engine is touched; engine failures abort only this submission.

use std::sync::Arc;

use thiserror::Error;

use crate::artifacts::LoadedArtifacts;
use crate::assembler::{AssemblyError, FeatureAssembler};
use crate::catalog::{CatalogField, OptionCatalog};
use crate::inference::{InferenceEngine, InferenceError};
use crate::models::{FeatureRecord, PatientInput, Recommendation};
use crate::ranker::{self, RankError, DEFAULT_TOP_K};

/// Pipeline errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Unable to compute recommendation: {0}")]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Rank(#[from] RankError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Produces ranked recommendations from raw form input.
#[derive(Debug, Clone)]
pub struct Recommender {
    assembler: FeatureAssembler,
    engine: InferenceEngine,
    catalog: Option<Arc<OptionCatalog>>,
    top_k: usize,
}

impl Recommender {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            assembler: FeatureAssembler::new(),
            engine,
            catalog: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Engine and catalog from a loaded artifact set.
    pub fn from_loaded(loaded: &LoadedArtifacts) -> Self {
        Self::new(loaded.engine.clone()).with_catalog(loaded.catalog.clone())
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Attach a catalog so unseen categorical answers get logged.
    pub fn with_catalog(mut self, catalog: Arc<OptionCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Recommend the `top_k` most probable treatments for one submission.
    pub fn recommend(&self, input: &PatientInput) -> PipelineResult<Recommendation> {
        let record = self.assembler.assemble(input).map_err(|e| {
            tracing::warn!(field = e.field().name(), error = %e, "Rejected submission");
            e
        })?;
        tracing::debug!(?record, "Assembled feature record");
        self.log_unknown_categories(&record);

        let probabilities = self.engine.infer(&record).map_err(|e| {
            tracing::error!(?record, error = %e, "Inference failed for submission");
            e
        })?;

        let entries = ranker::top_k(&probabilities, self.top_k)?;
        let recommendation = Recommendation::new(
            entries,
            self.engine.preprocessor_info().clone(),
            self.engine.classifier_info().clone(),
        );

        tracing::info!(
            submission_id = %recommendation.submission_id,
            preprocessor = %recommendation.preprocessor.label(),
            classifier = %recommendation.classifier.label(),
            top = recommendation.top().map(|p| p.label.as_str()).unwrap_or(""),
            "Generated recommendation"
        );

        Ok(recommendation)
    }

    fn log_unknown_categories(&self, record: &FeatureRecord) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        for field in CatalogField::ALL {
            let Some(value) = record.get(field.column()).and_then(|v| v.as_text()) else {
                continue;
            };
            let unseen = if field == CatalogField::Symptom {
                value
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .any(|s| !catalog.is_known(field, s))
            } else {
                !catalog.is_known(field, value)
            };
            if unseen {
                tracing::debug!(column = field.column(), value, "Category not seen in dataset");
            }
        }
    }
}
