//! JSON classifier artifacts.
//!
//! Two formats are understood: a (optionally standardised) logistic
//! regression and a forest of binary decision trees with majority voting.
//! Both are validated when loaded so prediction never indexes out of bounds.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Classifier, ModelError, ModelLoadError};
use crate::encoder::FeatureVector;

/// Where an artifact comes from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

/// Per-feature standardisation applied before the linear term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// One node of a preorder-encoded decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes to `left`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn classify(&self, x: &[f64]) -> Result<u8, ModelError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        ModelError::Failed(format!("split on missing feature {feature}"))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Failed(format!("node {index} does not exist")));
                }
            }
        }
        Err(ModelError::Failed("tree traversal did not reach a leaf".into()))
    }

    fn validate(&self, tree: usize, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {tree} has no nodes"));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { class } if *class > 1 => {
                    return Err(format!("tree {tree} node {index}: class {class} is not binary"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(format!(
                            "tree {tree} node {index}: feature {feature} out of range"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {tree} node {index}: non-finite threshold"));
                    }
                    // Children must point forward so traversal always terminates.
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(format!(
                                "tree {tree} node {index}: child {child} is not a forward index"
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// The on-disk shape of a classifier artifact, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ArtifactDefinition {
    LogisticRegression {
        feature_count: usize,
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default)]
        scaler: Option<Scaler>,
    },
    DecisionForest {
        feature_count: usize,
        trees: Vec<DecisionTree>,
    },
}

/// A validated classifier artifact.
///
/// Only obtainable through [`ModelArtifact::load`], [`ModelArtifact::from_slice`]
/// or `TryFrom<ArtifactDefinition>`, all of which run the structural checks,
/// so prediction never indexes out of bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArtifactDefinition", into = "ArtifactDefinition")]
pub struct ModelArtifact {
    definition: ArtifactDefinition,
}

impl TryFrom<ArtifactDefinition> for ModelArtifact {
    type Error = String;

    fn try_from(definition: ArtifactDefinition) -> Result<Self, Self::Error> {
        definition.validate()?;
        Ok(Self { definition })
    }
}

impl From<ModelArtifact> for ArtifactDefinition {
    fn from(artifact: ModelArtifact) -> Self {
        artifact.definition
    }
}

impl ModelArtifact {
    pub fn load(source: &ArtifactSource) -> Result<Self, ModelLoadError> {
        let bytes = match source {
            ArtifactSource::Path(path) => read_artifact(path)?,
            ArtifactSource::Bytes(bytes) => bytes.clone(),
        };
        Self::from_slice(&bytes, &source.to_string())
    }

    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self, ModelLoadError> {
        let definition: ArtifactDefinition = serde_json::from_slice(bytes)
            .map_err(|e| ModelLoadError::malformed(origin, e.to_string()))?;
        Self::try_from(definition).map_err(|reason| ModelLoadError::malformed(origin, reason))
    }

    pub fn definition(&self) -> &ArtifactDefinition {
        &self.definition
    }

    pub fn feature_count(&self) -> usize {
        self.definition.feature_count()
    }

    pub fn format_name(&self) -> &'static str {
        match self.definition {
            ArtifactDefinition::LogisticRegression { .. } => "logistic_regression",
            ArtifactDefinition::DecisionForest { .. } => "decision_forest",
        }
    }
}

impl ArtifactDefinition {
    pub fn feature_count(&self) -> usize {
        match self {
            Self::LogisticRegression { feature_count, .. }
            | Self::DecisionForest { feature_count, .. } => *feature_count,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::LogisticRegression {
                feature_count,
                coefficients,
                intercept,
                threshold,
                scaler,
            } => {
                if *feature_count == 0 {
                    return Err("feature_count must be positive".into());
                }
                if coefficients.len() != *feature_count {
                    return Err(format!(
                        "{} coefficients for {feature_count} features",
                        coefficients.len()
                    ));
                }
                if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
                    return Err("non-finite coefficient or intercept".into());
                }
                if !(0.0..=1.0).contains(threshold) {
                    return Err(format!("threshold {threshold} outside [0, 1]"));
                }
                if let Some(scaler) = scaler {
                    if scaler.mean.len() != *feature_count || scaler.scale.len() != *feature_count {
                        return Err("scaler length does not match feature_count".into());
                    }
                    if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                        return Err("scaler contains a zero or non-finite scale".into());
                    }
                }
                Ok(())
            }
            Self::DecisionForest {
                feature_count,
                trees,
            } => {
                if *feature_count == 0 {
                    return Err("feature_count must be positive".into());
                }
                if trees.is_empty() {
                    return Err("forest has no trees".into());
                }
                trees
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, tree)| tree.validate(i, *feature_count))
            }
        }
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_slice();
        if x.len() != self.feature_count() {
            return Err(ModelError::FeatureCount {
                expected: self.feature_count(),
                actual: x.len(),
            });
        }

        match &self.definition {
            ArtifactDefinition::LogisticRegression {
                coefficients,
                intercept,
                threshold,
                scaler,
                ..
            } => {
                let z = coefficients
                    .iter()
                    .enumerate()
                    .map(|(i, w)| {
                        let value = match scaler {
                            Some(s) => (x[i] - s.mean[i]) / s.scale[i],
                            None => x[i],
                        };
                        w * value
                    })
                    .sum::<f64>()
                    + intercept;
                let probability = 1.0 / (1.0 + (-z).exp());
                if probability.is_nan() {
                    return Err(ModelError::Failed("probability is NaN".into()));
                }
                Ok(if probability >= *threshold { 1.0 } else { 0.0 })
            }
            ArtifactDefinition::DecisionForest { trees, .. } => {
                if trees.is_empty() {
                    return Err(ModelError::Failed("forest has no trees".into()));
                }
                let mut positive = 0;
                for tree in trees {
                    if tree.classify(x)? == 1 {
                        positive += 1;
                    }
                }
                // Ties go to the positive class.
                Ok(if positive * 2 >= trees.len() { 1.0 } else { 0.0 })
            }
        }
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ModelLoadError::Missing(path.to_path_buf()),
        _ => ModelLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}
