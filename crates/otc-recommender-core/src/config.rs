//! Recommender configuration.
//!
//! Read from a JSON file (or defaults), then overridden by `OTC_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use otc_recommender_fetch::FetchPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DEFAULT_MIN_LABEL_COUNT;
use crate::ranker::DEFAULT_TOP_K;

pub const ENV_PREPROCESSOR: &str = "OTC_PREPROCESSOR";
pub const ENV_CLASSIFIER: &str = "OTC_CLASSIFIER";
pub const ENV_DATASET: &str = "OTC_DATASET";
pub const ENV_TOP_K: &str = "OTC_TOP_K";
pub const ENV_MIN_LABEL_COUNT: &str = "OTC_MIN_LABEL_COUNT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "OTC_FETCH_TIMEOUT_SECS";
pub const ENV_FETCH_MAX_ATTEMPTS: &str = "OTC_FETCH_MAX_ATTEMPTS";

pub const DEFAULT_PREPROCESSOR: &str = "otc_preprocessor_no_postpain.json";
pub const DEFAULT_CLASSIFIER: &str =
    "https://otc-only-model.s3.amazonaws.com/otc_classifier_no_postpain.json";
pub const DEFAULT_DATASET: &str = "OTC-Data.csv";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Location of one model artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactConfig {
    /// Local path or `http(s)://` URL
    pub location: String,
    /// Pinned SHA-256 (hex); the load fails on mismatch
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ArtifactConfig {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}

/// Retry policy for remote artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommenderConfig {
    pub preprocessor: ArtifactConfig,
    pub classifier: ArtifactConfig,
    /// Historical dataset backing the option catalog
    pub dataset_path: PathBuf,
    pub top_k: usize,
    pub min_label_count: usize,
    pub fetch: FetchConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            preprocessor: ArtifactConfig::new(DEFAULT_PREPROCESSOR),
            classifier: ArtifactConfig::new(DEFAULT_CLASSIFIER),
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            top_k: DEFAULT_TOP_K,
            min_label_count: DEFAULT_MIN_LABEL_COUNT,
            fetch: FetchConfig::default(),
        }
    }
}

impl RecommenderConfig {
    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// File (or defaults when `path` is `None`) plus environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `OTC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_PREPROCESSOR) {
            self.preprocessor = ArtifactConfig::new(v.trim());
        }
        if let Some(v) = get(ENV_CLASSIFIER) {
            self.classifier = ArtifactConfig::new(v.trim());
        }
        if let Some(v) = get(ENV_DATASET) {
            self.dataset_path = PathBuf::from(v.trim());
        }
        if let Some(v) = get(ENV_TOP_K) {
            self.top_k = parse_env(ENV_TOP_K, &v)?;
        }
        if let Some(v) = get(ENV_MIN_LABEL_COUNT) {
            self.min_label_count = parse_env(ENV_MIN_LABEL_COUNT, &v)?;
        }
        if let Some(v) = get(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch.timeout_secs = parse_env(ENV_FETCH_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(ENV_FETCH_MAX_ATTEMPTS) {
            self.fetch.max_attempts = parse_env(ENV_FETCH_MAX_ATTEMPTS, &v)?;
        }

        self.validate()
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.top_k < 1 {
            return Err(ConfigError::InvalidValue {
                key: "top_k".into(),
                value: self.top_k.to_string(),
            });
        }
        if self.fetch.max_attempts < 1 {
            return Err(ConfigError::InvalidValue {
                key: "fetch.max_attempts".into(),
                value: self.fetch.max_attempts.to_string(),
            });
        }
        Ok(())
    }

    /// Fetch policy for remote artifacts.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_attempts: self.fetch.max_attempts,
            backoff: Duration::from_millis(self.fetch.backoff_ms),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
