#![warn(missing_docs)]
//! Customer churn prediction form: schema validation, feature encoding, and a
//! pluggable classifier behind a single HTML page.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod csrf;
pub mod encoder;
pub mod logging;
pub mod page;
pub mod record;
pub mod schema;
pub mod server;

pub use artifact::{ArtifactError, ChurnModel};
pub use classifier::{predict, Classifier, ClassifierError, Prediction, PredictionError};
pub use config::{Cli, ServerConfig};
pub use encoder::{encode, FeatureVector, FEATURE_COUNT};
pub use page::Outcome;
pub use record::{CustomerRecord, EncodeError};
pub use schema::{validate, FieldKind, FieldSpec, ValidatedForm, ValidationErrors, FIELDS};
pub use server::{router, run_prediction, serve};
