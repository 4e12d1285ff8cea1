//! Loading the pre-trained churn model from its JSON artifact.
//!
//! The artifact is read once at startup and never mutated afterwards, so the
//! resulting [`ChurnModel`] can be shared across requests without locking.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::classifier::{Classifier, ClassifierError};
use crate::encoder::{FeatureVector, FEATURE_COUNT};
use crate::schema;

/// Artifact layout version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    classifier: ClassifierSpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierSpec {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        threshold: Option<f64>,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

/// One node of a decision tree. Node 0 is the root.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Terminal node carrying the predicted label.
    Leaf {
        /// Predicted label.
        leaf: i64,
    },
    /// Samples with `x[feature] <= threshold` continue at `left`, others at `right`.
    Split {
        /// Feature index.
        feature: usize,
        /// Split point.
        threshold: f64,
        /// Child index for the `<=` branch.
        left: usize,
        /// Child index for the `>` branch.
        right: usize,
    },
}

/// Binary logistic regression over the sixteen features.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    threshold: f64,
}

impl LogisticRegression {
    /// Probability of the positive (churn) class.
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_slice())
                .map(|(coef, value)| coef * value)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }

    fn label(&self, features: &FeatureVector) -> i64 {
        i64::from(self.probability(features) >= self.threshold)
    }
}

/// Decision tree whose child indices always point forward.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn label(&self, features: &FeatureVector) -> i64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { leaf } => return leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Model kinds an artifact can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    /// Linear model with a sigmoid link.
    LogisticRegression(LogisticRegression),
    /// Single decision tree.
    DecisionTree(DecisionTree),
}

/// Loaded, validated churn model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChurnModel {
    source: Option<PathBuf>,
    feature_names: Option<Vec<String>>,
    kind: ModelKind,
}

impl ChurnModel {
    /// Reads and validates an artifact file.
    pub fn load(path: &Path, require_feature_names: bool) -> Result<Self, ArtifactError> {
        let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut model = Self::from_json(&text, require_feature_names)?;
        model.source = Some(path.to_path_buf());
        Ok(model)
    }

    /// Parses and validates an artifact document.
    pub fn from_json(text: &str, require_feature_names: bool) -> Result<Self, ArtifactError> {
        let file: ArtifactFile = serde_json::from_str(text).map_err(ArtifactError::Parse)?;
        if file.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(file.format_version));
        }
        match &file.feature_names {
            Some(names) => check_feature_names(names)?,
            None if require_feature_names => return Err(ArtifactError::FeatureNamesMissing),
            None => {}
        }
        let kind = match file.classifier {
            ClassifierSpec::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => ModelKind::LogisticRegression(build_logistic(coefficients, intercept, threshold)?),
            ClassifierSpec::DecisionTree { nodes } => ModelKind::DecisionTree(build_tree(nodes)?),
        };
        Ok(Self {
            source: None,
            feature_names: file.feature_names,
            kind,
        })
    }

    /// File the model was loaded from, when it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Feature names declared by the artifact, if any.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// The underlying model.
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    /// Short name of the model kind, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ModelKind::LogisticRegression(_) => "logistic_regression",
            ModelKind::DecisionTree(_) => "decision_tree",
        }
    }
}

impl Classifier for ChurnModel {
    fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError> {
        if batch.is_empty() {
            return Err(ClassifierError::InvalidInput("empty batch".to_string()));
        }
        batch
            .iter()
            .enumerate()
            .map(|(row, features)| {
                if !features.is_finite() {
                    return Err(ClassifierError::InvalidInput(format!(
                        "row {row} contains non-finite values"
                    )));
                }
                Ok(match &self.kind {
                    ModelKind::LogisticRegression(model) => model.label(features),
                    ModelKind::DecisionTree(tree) => tree.label(features),
                })
            })
            .collect()
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::FeatureCount {
            expected: FEATURE_COUNT,
            found: names.len(),
        });
    }
    for (index, (found, expected)) in names.iter().zip(schema::feature_names()).enumerate() {
        if found != expected {
            return Err(ArtifactError::FeatureMismatch {
                index,
                expected,
                found: found.clone(),
            });
        }
    }
    Ok(())
}

fn build_logistic(
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: Option<f64>,
) -> Result<LogisticRegression, ArtifactError> {
    let found = coefficients.len();
    let coefficients: [f64; FEATURE_COUNT] =
        coefficients.try_into().map_err(|_| ArtifactError::CoefficientCount {
            expected: FEATURE_COUNT,
            found,
        })?;
    if !coefficients.iter().all(|coef| coef.is_finite()) {
        return Err(ArtifactError::NonFinite("coefficients"));
    }
    if !intercept.is_finite() {
        return Err(ArtifactError::NonFinite("intercept"));
    }
    let threshold = threshold.unwrap_or(DEFAULT_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ArtifactError::ThresholdOutOfRange(threshold));
    }
    Ok(LogisticRegression {
        coefficients,
        intercept,
        threshold,
    })
}

fn build_tree(nodes: Vec<TreeNode>) -> Result<DecisionTree, ArtifactError> {
    if nodes.is_empty() {
        return Err(ArtifactError::EmptyTree);
    }
    for (node, entry) in nodes.iter().enumerate() {
        if let TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } = *entry
        {
            if feature >= FEATURE_COUNT {
                return Err(ArtifactError::TreeFeature { node, feature });
            }
            if !threshold.is_finite() {
                return Err(ArtifactError::NonFinite("tree threshold"));
            }
            for child in [left, right] {
                if child <= node || child >= nodes.len() {
                    return Err(ArtifactError::TreeChild { node, child });
                }
            }
        }
    }
    Ok(DecisionTree { nodes })
}

/// Errors raised while loading a model artifact.
#[derive(Debug)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The document is not valid artifact JSON.
    Parse(serde_json::Error),
    /// The artifact was written for another layout version.
    UnsupportedVersion(u32),
    /// Feature names were required but the artifact has none.
    FeatureNamesMissing,
    /// The artifact declares the wrong number of features.
    FeatureCount {
        /// Features the encoder produces.
        expected: usize,
        /// Features the artifact declares.
        found: usize,
    },
    /// A declared feature name disagrees with the encoder order.
    FeatureMismatch {
        /// Position in the vector.
        index: usize,
        /// Name the encoder uses.
        expected: &'static str,
        /// Name the artifact declares.
        found: String,
    },
    /// Logistic regression coefficient count differs from the feature count.
    CoefficientCount {
        /// Features the encoder produces.
        expected: usize,
        /// Coefficients in the artifact.
        found: usize,
    },
    /// A model parameter is NaN or infinite.
    NonFinite(&'static str),
    /// Decision threshold outside `[0, 1]`.
    ThresholdOutOfRange(f64),
    /// A decision tree without nodes.
    EmptyTree,
    /// A split refers to a feature index past the vector.
    TreeFeature {
        /// Node index.
        node: usize,
        /// Offending feature index.
        feature: usize,
    },
    /// A split points backwards or past the node list.
    TreeChild {
        /// Node index.
        node: usize,
        /// Offending child index.
        child: usize,
    },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read model artifact {}: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed model artifact: {err}"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "unsupported artifact format_version {version} (expected {FORMAT_VERSION})"
            ),
            Self::FeatureNamesMissing => {
                write!(f, "artifact does not declare feature_names")
            }
            Self::FeatureCount { expected, found } => write!(
                f,
                "artifact declares {found} features, encoder produces {expected}"
            ),
            Self::FeatureMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "feature {index} is '{found}' in the artifact but '{expected}' in the encoder"
            ),
            Self::CoefficientCount { expected, found } => {
                write!(f, "expected {expected} coefficients, found {found}")
            }
            Self::NonFinite(what) => write!(f, "artifact {what} must be finite"),
            Self::ThresholdOutOfRange(value) => {
                write!(f, "threshold {value} is outside [0, 1]")
            }
            Self::EmptyTree => write!(f, "decision tree has no nodes"),
            Self::TreeFeature { node, feature } => {
                write!(f, "tree node {node} splits on unknown feature {feature}")
            }
            Self::TreeChild { node, child } => {
                write!(f, "tree node {node} has invalid child {child}")
            }
        }
    }
}

impl Error for ArtifactError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
