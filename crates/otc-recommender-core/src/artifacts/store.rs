//! Process-wide, initialize-once cache of loaded artifacts.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use thiserror::Error;

use super::{load_classifier, load_preprocessor, ArtifactError};
use crate::catalog::{CatalogError, OptionCatalog};
use crate::config::RecommenderConfig;
use crate::inference::InferenceEngine;

/// Initialization errors. Nothing is cached when one occurs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Everything a request needs, loaded together.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub engine: InferenceEngine,
    pub catalog: Arc<OptionCatalog>,
}

impl LoadedArtifacts {
    pub fn new(engine: InferenceEngine, catalog: OptionCatalog) -> Self {
        Self {
            engine,
            catalog: Arc::new(catalog),
        }
    }

    /// Load both models and build the option catalog from `config`.
    pub fn load(config: &RecommenderConfig) -> Result<Self, LoadError> {
        let policy = config.fetch_policy();

        let preprocessor = load_preprocessor(&config.preprocessor, &policy)?;
        let classifier = load_classifier(&config.classifier, &policy)?;
        if preprocessor.output_len() != classifier.n_features() {
            return Err(ArtifactError::Invalid(format!(
                "preprocessor produces {} features but classifier expects {}",
                preprocessor.output_len(),
                classifier.n_features()
            ))
            .into());
        }

        let catalog = OptionCatalog::from_path(&config.dataset_path, config.min_label_count)?;
        let engine = InferenceEngine::new(Arc::new(preprocessor), Arc::new(classifier));

        tracing::info!(
            preprocessor = %engine.preprocessor_info().label(),
            classifier = %engine.classifier_info().label(),
            classes = engine.class_labels().len(),
            "Loaded recommender artifacts"
        );

        Ok(Self::new(engine, catalog))
    }
}

/// Holds [`LoadedArtifacts`] once initialized.
///
/// The first successful `get_or_init` wins; concurrent callers block on the
/// init guard and then see the cached value. `reload` builds a new set while
/// readers keep the old one, then swaps it in. `invalidate` drops the cache so
/// the next access reloads.
#[derive(Default)]
pub struct ArtifactStore {
    current: RwLock<Option<Arc<LoadedArtifacts>>>,
    init: Mutex<()>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached artifacts, if initialized.
    pub fn current(&self) -> Option<Arc<LoadedArtifacts>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }

    /// Return the cached artifacts, running `loader` exactly once if empty.
    pub fn get_or_init<E, F>(&self, loader: F) -> Result<Arc<LoadedArtifacts>, E>
    where
        F: FnOnce() -> Result<LoadedArtifacts, E>,
    {
        if let Some(loaded) = self.current() {
            return Ok(loaded);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished while we waited
        if let Some(loaded) = self.current() {
            return Ok(loaded);
        }

        let loaded = Arc::new(loader()?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Run `loader` and swap its result in. Readers see the previous set until
    /// the swap; a failed load leaves it in place.
    pub fn reload<E, F>(&self, loader: F) -> Result<Arc<LoadedArtifacts>, E>
    where
        F: FnOnce() -> Result<LoadedArtifacts, E>,
    {
        let loaded = self.replace(loader()?);
        tracing::info!("Reloaded recommender artifacts");
        Ok(loaded)
    }

    /// Replace the cached artifacts unconditionally.
    pub fn replace(&self, loaded: LoadedArtifacts) -> Arc<LoadedArtifacts> {
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        let loaded = Arc::new(loaded);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    /// Drop the cached artifacts. In-flight requests keep their `Arc`.
    pub fn invalidate(&self) {
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!("Invalidated recommender artifacts");
    }
}

/// The process-wide store.
pub fn global_store() -> Arc<ArtifactStore> {
    static STORE: OnceLock<Arc<ArtifactStore>> = OnceLock::new();
    STORE.get_or_init(|| Arc::new(ArtifactStore::new())).clone()
}
