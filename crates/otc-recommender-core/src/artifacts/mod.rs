//! Model artifacts: retrieval, fingerprinting and deserialization.
//!
//! Artifacts are JSON exports of the fitted preprocessor and classifier.
//! They are read from a local path or fetched over HTTPS, fingerprinted with
//! SHA-256 and validated before the engine ever sees them. Any failure along
//! the way becomes a single [`ArtifactError::Unavailable`].

mod classifier;
mod preprocessor;
mod store;

pub use classifier::*;
pub use preprocessor::*;
pub use store::*;

use std::fmt;
use std::path::PathBuf;

use otc_recommender_fetch::{fetch_url, FetchPolicy};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ArtifactConfig;

/// Artifact errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("{artifact} artifact unavailable from {location}: {reason}")]
    Unavailable {
        artifact: String,
        location: String,
        reason: String,
    },

    /// Bytes were read but do not describe a usable model.
    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

impl ArtifactError {
    /// Attach the artifact name and location to a lower-level failure.
    pub fn unavailable(artifact: &str, location: &ArtifactLocation, reason: impl fmt::Display) -> Self {
        ArtifactError::Unavailable {
            artifact: artifact.to_string(),
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Where an artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Path(PathBuf),
    Url(String),
}

impl ArtifactLocation {
    /// `http://` and `https://` locations are URLs; anything else is a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            ArtifactLocation::Url(location.to_string())
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            ArtifactLocation::Path(PathBuf::from(path))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ArtifactLocation::Url(_))
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::Path(path) => write!(f, "{}", path.display()),
            ArtifactLocation::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Artifact bytes with their fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBytes {
    pub bytes: Vec<u8>,
    pub sha256: String,
}

/// Read an artifact and check it against an optional pinned checksum.
///
/// Remote locations go through the fetch crate's retry policy; the core adds
/// no retries of its own.
pub fn read_artifact_bytes(
    artifact: &str,
    location: &ArtifactLocation,
    policy: &FetchPolicy,
    expected_sha256: Option<&str>,
) -> ArtifactResult<ArtifactBytes> {
    let bytes = match location {
        ArtifactLocation::Path(path) => std::fs::read(path)
            .map_err(|e| ArtifactError::unavailable(artifact, location, e))?,
        ArtifactLocation::Url(url) => fetch_url(url, policy.clone())
            .map_err(|e| ArtifactError::unavailable(artifact, location, e))?,
    };

    let sha256 = sha256_hex(&bytes);
    if let Some(expected) = expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&sha256) {
            return Err(ArtifactError::unavailable(
                artifact,
                location,
                format!("sha256 mismatch: expected {}, got {}", expected.trim(), sha256),
            ));
        }
    }

    tracing::debug!(artifact, %location, bytes = bytes.len(), sha256 = %sha256, "Read artifact");
    Ok(ArtifactBytes { bytes, sha256 })
}

/// Load and validate the preprocessor described by `config`.
pub fn load_preprocessor(
    config: &ArtifactConfig,
    policy: &FetchPolicy,
) -> ArtifactResult<TabularPreprocessor> {
    const NAME: &str = "preprocessor";
    let location = ArtifactLocation::parse(&config.location);
    let artifact = read_artifact_bytes(NAME, &location, policy, config.sha256.as_deref())?;
    TabularPreprocessor::from_slice(&artifact.bytes, artifact.sha256)
        .map_err(|e| ArtifactError::unavailable(NAME, &location, e))
}

/// Load and validate the classifier described by `config`.
pub fn load_classifier(
    config: &ArtifactConfig,
    policy: &FetchPolicy,
) -> ArtifactResult<ModelClassifier> {
    const NAME: &str = "classifier";
    let location = ArtifactLocation::parse(&config.location);
    let artifact = read_artifact_bytes(NAME, &location, policy, config.sha256.as_deref())?;
    ModelClassifier::from_slice(&artifact.bytes, artifact.sha256)
        .map_err(|e| ArtifactError::unavailable(NAME, &location, e))
}
