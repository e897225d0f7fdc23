//! Inference engine: preprocessor transform followed by classifier probabilities.
//!
//! The fitted models are opaque. Concrete representations live in
//! [`crate::artifacts`]; the engine only sees these traits.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{ArtifactInfo, ClassProbability, FeatureRecord, FeatureVector};

/// Tolerance for the probabilities of one prediction to sum to 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Inference errors. Deterministic for identical input, so never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Preprocessor rejected the feature record: {0}")]
    Transform(String),

    #[error("Classifier rejected the feature vector: {0}")]
    Classifier(String),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

/// Fitted feature encoder.
pub trait Preprocessor: Send + Sync {
    /// Artifact identity.
    fn info(&self) -> &ArtifactInfo;

    /// Encode a record. Fails with [`InferenceError::Transform`].
    fn transform(&self, record: &FeatureRecord) -> InferenceResult<FeatureVector>;
}

/// Fitted probabilistic classifier.
pub trait Classifier: Send + Sync {
    /// Artifact identity.
    fn info(&self) -> &ArtifactInfo;

    /// Class labels in the classifier's fixed order.
    fn class_labels(&self) -> &[String];

    /// One probability per class, in [`Classifier::class_labels`] order.
    /// Fails with [`InferenceError::Classifier`].
    fn predict_probabilities(&self, vector: &[f64]) -> InferenceResult<Vec<f64>>;
}

/// Pairs a preprocessor with a classifier. Cheap to clone; read-only.
#[derive(Clone)]
pub struct InferenceEngine {
    preprocessor: Arc<dyn Preprocessor>,
    classifier: Arc<dyn Classifier>,
}

impl InferenceEngine {
    pub fn new(preprocessor: Arc<dyn Preprocessor>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            preprocessor,
            classifier,
        }
    }

    /// Encode a record with the preprocessor.
    pub fn transform(&self, record: &FeatureRecord) -> InferenceResult<FeatureVector> {
        self.preprocessor.transform(record)
    }

    /// Run the classifier and label its output.
    ///
    /// Output is checked: one finite value in [0, 1] per class, summing to 1
    /// within [`PROBABILITY_SUM_TOLERANCE`].
    pub fn predict_probabilities(&self, vector: &[f64]) -> InferenceResult<Vec<ClassProbability>> {
        let labels = self.classifier.class_labels();
        let probabilities = self.classifier.predict_probabilities(vector)?;

        if probabilities.len() != labels.len() {
            return Err(InferenceError::Classifier(format!(
                "expected {} probabilities, got {}",
                labels.len(),
                probabilities.len()
            )));
        }
        if let Some(bad) = probabilities
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
        {
            return Err(InferenceError::Classifier(format!(
                "probability {} outside [0, 1]",
                bad
            )));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(InferenceError::Classifier(format!(
                "probabilities sum to {}, expected 1",
                sum
            )));
        }

        Ok(labels
            .iter()
            .zip(probabilities)
            .enumerate()
            .map(|(idx, (label, p))| ClassProbability::new(idx, label.clone(), p))
            .collect())
    }

    /// Transform then predict.
    pub fn infer(&self, record: &FeatureRecord) -> InferenceResult<Vec<ClassProbability>> {
        let vector = self.transform(record)?;
        tracing::debug!(features = vector.len(), "Encoded feature record");
        self.predict_probabilities(&vector)
    }

    /// Classifier class labels.
    pub fn class_labels(&self) -> &[String] {
        self.classifier.class_labels()
    }

    pub fn preprocessor_info(&self) -> &ArtifactInfo {
        self.preprocessor.info()
    }

    pub fn classifier_info(&self) -> &ArtifactInfo {
        self.classifier.info()
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("preprocessor", &self.preprocessor.info().label())
            .field("classifier", &self.classifier.info().label())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn record() -> FeatureRecord {
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

    fn engine(labels: &[&str], output: Vec<f64>) -> InferenceEngine {
        InferenceEngine::new(
            Arc::new(NumericPreprocessor::new()),
            Arc::new(FixedClassifier::new(labels, output)),
        )
    }

    #[test]
    fn test_probabilities_labelled_in_class_order() {
        let engine = engine(&["A", "B", "C"], vec![0.2, 0.5, 0.3]);
        let probs = engine.infer(&record()).unwrap();

        assert_eq!(probs.len(), 3);
        assert_eq!(probs[1], ClassProbability::new(1, "B", 0.5));
        let sum: f64 = probs.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < PROBABILITY_SUM_TOLERANCE);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let engine = engine(&["A", "B", "C"], vec![0.5, 0.5]);
        let err = engine.infer(&record()).unwrap_err();
        assert!(matches!(err, InferenceError::Classifier(_)));
    }

    #[test]
    fn test_unnormalized_output_rejected() {
        let overweight = engine(&["A", "B"], vec![0.7, 0.7]);
        assert!(overweight.infer(&record()).is_err());

        let not_a_number = engine(&["A", "B"], vec![f64::NAN, 1.0]);
        assert!(not_a_number.infer(&record()).is_err());
    }

    #[test]
    fn test_classifier_rejects_vector_shape() {
        let engine = engine(&["A"], vec![1.0]);
        let err = engine.predict_probabilities(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            InferenceError::Classifier("expected 4 features, got 2".into())
        );
    }

    #[test]
    fn test_deterministic() {
        let engine = engine(&["A", "B", "C"], vec![0.1, 0.6, 0.3]);
        assert_eq!(engine.infer(&record()).unwrap(), engine.infer(&record()).unwrap());
    }
}
