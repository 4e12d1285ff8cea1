//! Classifier boundary and the single-sample prediction invoker.

use std::error::Error;
use std::fmt;

use crate::encoder::FeatureVector;

/// Opaque binary classifier shared read-only across requests.
pub trait Classifier: Send + Sync {
    /// Predicts one label per input vector.
    fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError>;
}

/// Failure raised from inside a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// The classifier rejected its input.
    InvalidInput(String),
    /// The classifier failed internally.
    Internal(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid classifier input: {msg}"),
            Self::Internal(msg) => write!(f, "classifier failure: {msg}"),
        }
    }
}

impl Error for ClassifierError {}

/// Outcome shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    /// Label `1`.
    Churn,
    /// Label `0`.
    NoChurn,
}

impl Prediction {
    /// Maps a raw model label.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(Self::Churn),
            0 => Some(Self::NoChurn),
            _ => None,
        }
    }

    /// Display text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Churn => "Churn",
            Self::NoChurn => "No Churn",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced while invoking the classifier for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    /// The classifier itself failed.
    Classifier(ClassifierError),
    /// The classifier returned a batch of the wrong size.
    UnexpectedShape {
        /// Number of labels returned for a single-sample batch.
        returned: usize,
    },
    /// The classifier returned a label outside {0, 1}.
    UnexpectedLabel(i64),
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier(err) => write!(f, "{err}"),
            Self::UnexpectedShape { returned } => {
                write!(f, "classifier returned {returned} labels for 1 sample")
            }
            Self::UnexpectedLabel(label) => write!(f, "classifier returned unknown label {label}"),
        }
    }
}

impl Error for PredictionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Classifier(err) => Some(err),
            Self::UnexpectedShape { .. } | Self::UnexpectedLabel(_) => None,
        }
    }
}

impl From<ClassifierError> for PredictionError {
    fn from(err: ClassifierError) -> Self {
        Self::Classifier(err)
    }
}

/// Submits one vector as a single-sample batch and interprets the label.
pub fn predict(
    classifier: &dyn Classifier,
    features: FeatureVector,
) -> Result<Prediction, PredictionError> {
    let labels = classifier.predict_batch(&[features])?;
    match labels.as_slice() {
        [label] => Prediction::from_label(*label).ok_or(PredictionError::UnexpectedLabel(*label)),
        other => Err(PredictionError::UnexpectedShape {
            returned: other.len(),
        }),
    }
}
