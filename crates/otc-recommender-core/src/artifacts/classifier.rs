//! Classifier artifacts: multinomial logistic regression and decision forests.

use serde::{Deserialize, Serialize};

use super::{ArtifactError, ArtifactResult};
use crate::inference::{Classifier, InferenceError, InferenceResult};
use crate::models::ArtifactInfo;

/// Serialized classifier, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierDocument {
    Softmax(SoftmaxModel),
    Forest(ForestModel),
}

/// Linear model with softmax (or sigmoid, for one row and two classes) output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoftmaxModel {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    pub classes: Vec<String>,
    pub n_features: usize,
    /// One row per class, `n_features` wide
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl SoftmaxModel {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coefficients.len() == 1
    }

    fn validate(&self) -> ArtifactResult<()> {
        let k = self.classes.len();
        let rows = if self.is_binary() { 1 } else { k };

        if self.coefficients.len() != rows || self.intercepts.len() != rows {
            return Err(ArtifactError::Invalid(format!(
                "softmax model with {} classes needs {} coefficient rows and intercepts, got {} and {}",
                k,
                rows,
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        for (i, row) in self.coefficients.iter().enumerate() {
            if row.len() != self.n_features {
                return Err(ArtifactError::Invalid(format!(
                    "coefficient row {} has {} values, expected {}",
                    i,
                    row.len(),
                    self.n_features
                )));
            }
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::Invalid("non-finite coefficient".into()));
        }
        Ok(())
    }

    fn predict(&self, vector: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(vector).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        if self.is_binary() {
            let p = 1.0 / (1.0 + (-logits[0]).exp());
            return vec![1.0 - p, p];
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

/// One node of a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (counts or fractions).
    Leaf { value: Vec<f64> },
}

/// A decision tree; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    // Children must come after their parent, which rules out cycles
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} points to invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} values, expected {}",
                            idx,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("leaf {} has invalid weights", idx));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(format!("leaf {} has zero total weight", idx));
                    }
                }
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `vector`.
    fn leaf_distribution(&self, vector: &[f64]) -> Vec<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if vector[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return value.iter().map(|v| v / total).collect();
                }
            }
        }
    }
}

/// Forest whose prediction is the mean of its trees' leaf distributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    pub classes: Vec<String>,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    fn validate(&self) -> ArtifactResult<()> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| ArtifactError::Invalid(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    fn predict(&self, vector: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (sum, p) in sums.iter_mut().zip(tree.leaf_distribution(vector)) {
                *sum += p;
            }
        }
        let n = self.trees.len() as f64;
        sums.into_iter().map(|s| s / n).collect()
    }
}

impl ClassifierDocument {
    fn classes(&self) -> &[String] {
        match self {
            ClassifierDocument::Softmax(m) => &m.classes,
            ClassifierDocument::Forest(m) => &m.classes,
        }
    }

    fn n_features(&self) -> usize {
        match self {
            ClassifierDocument::Softmax(m) => m.n_features,
            ClassifierDocument::Forest(m) => m.n_features,
        }
    }
}

/// A validated classifier artifact.
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    info: ArtifactInfo,
    model: ClassifierDocument,
}

impl ModelClassifier {
    /// Parse and validate a JSON document.
    pub fn from_slice(bytes: &[u8], sha256: String) -> ArtifactResult<Self> {
        let document: ClassifierDocument = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::Invalid(format!("classifier JSON: {}", e)))?;
        Self::from_document(document, sha256)
    }

    /// Validate a parsed document.
    pub fn from_document(model: ClassifierDocument, sha256: String) -> ArtifactResult<Self> {
        let classes = model.classes();
        if classes.len() < 2 {
            return Err(ArtifactError::Invalid(format!(
                "classifier needs at least 2 classes, got {}",
                classes.len()
            )));
        }
        if let Some(dup) = classes
            .iter()
            .enumerate()
            .find(|(i, c)| classes[..*i].contains(c))
            .map(|(_, c)| c)
        {
            return Err(ArtifactError::Invalid(format!("class '{}' declared twice", dup)));
        }
        if model.n_features() == 0 {
            return Err(ArtifactError::Invalid("classifier declares no features".into()));
        }

        let (id, version) = match &model {
            ClassifierDocument::Softmax(m) => {
                m.validate()?;
                (m.id.clone(), m.version.clone())
            }
            ClassifierDocument::Forest(m) => {
                m.validate()?;
                (m.id.clone(), m.version.clone())
            }
        };

        Ok(Self {
            info: ArtifactInfo { id, version, sha256 },
            model,
        })
    }

    /// Expected feature vector length.
    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }
}

impl Classifier for ModelClassifier {
    fn info(&self) -> &ArtifactInfo {
        &self.info
    }

    fn class_labels(&self) -> &[String] {
        self.model.classes()
    }

    fn predict_probabilities(&self, vector: &[f64]) -> InferenceResult<Vec<f64>> {
        let expected = self.model.n_features();
        if vector.len() != expected {
            return Err(InferenceError::Classifier(format!(
                "expected {} features, got {}",
                expected,
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::Classifier("feature vector is not finite".into()));
        }

        Ok(match &self.model {
            ClassifierDocument::Softmax(m) => m.predict(vector),
            ClassifierDocument::Forest(m) => m.predict(vector),
        })
    }
}
