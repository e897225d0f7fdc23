//! Prediction and recommendation models.

use serde::{Deserialize, Serialize};

/// Probability assigned to one treatment class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassProbability {
    /// Position of the class in the classifier's own class ordering
    pub class_index: usize,
    /// Treatment label (e.g., "Naproxen")
    pub label: String,
    /// Probability in [0, 1]
    pub probability: f64,
}

impl ClassProbability {
    pub fn new(class_index: usize, label: impl Into<String>, probability: f64) -> Self {
        Self {
            class_index,
            label: label.into(),
            probability,
        }
    }

    /// Presentation line, e.g. `"Naproxen: 41.2% confidence"`.
    pub fn display_line(&self) -> String {
        format!("{}: {:.1}% confidence", self.label, self.probability * 100.0)
    }
}

/// Identity of a loaded model artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Stable identifier declared by the artifact
    pub id: String,
    /// Optional version declared by the artifact
    pub version: Option<String>,
    /// SHA-256 of the artifact bytes (hex)
    pub sha256: String,
}

impl ArtifactInfo {
    /// `id@version#sha-prefix`, for logs.
    pub fn label(&self) -> String {
        let short: String = self.sha256.chars().take(12).collect();
        match &self.version {
            Some(v) => format!("{}@{}#{}", self.id, v, short),
            None => format!("{}#{}", self.id, short),
        }
    }
}

/// Ranked top-K recommendation for one submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Submission ID (UUID v4), used to correlate logs
    pub submission_id: String,
    /// Entries ordered by descending probability
    pub entries: Vec<ClassProbability>,
    /// Preprocessor that encoded the features
    pub preprocessor: ArtifactInfo,
    /// Classifier that produced the probabilities
    pub classifier: ArtifactInfo,
    /// Generation timestamp (RFC 3339)
    pub generated_at: String,
}

impl Recommendation {
    /// Create a recommendation with a fresh submission ID and timestamp.
    pub fn new(
        entries: Vec<ClassProbability>,
        preprocessor: ArtifactInfo,
        classifier: ArtifactInfo,
    ) -> Self {
        Self {
            submission_id: uuid::Uuid::new_v4().to_string(),
            entries,
            preprocessor,
            classifier,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Labels in ranked order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Best-ranked entry.
    pub fn top(&self) -> Option<&ClassProbability> {
        self.entries.first()
    }

    /// One presentation line per entry.
    pub fn display_lines(&self) -> Vec<String> {
        self.entries.iter().map(ClassProbability::display_line).collect()
    }
}
