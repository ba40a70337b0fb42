//! Estimator and model contracts.
//!
//! The lifecycle engine never looks inside a training algorithm: it hands a
//! training window to an [`Estimator`] and gets back an opaque [`Model`].
//! Model bytes are owned by the estimator that produced them — the engine
//! persists them verbatim and asks the same estimator to revive them.

use thiserror::Error;

use crate::domain::{FeatureRecord, Prediction};

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("cannot fit on an empty training window")]
    EmptyTrainingWindow,
    #[error("fit failed: {0}")]
    Fit(String),
    #[error("predict failed: {0}")]
    Predict(String),
    #[error("model serialization failed: {0}")]
    Serialize(String),
    #[error("model deserialization failed: {0}")]
    Deserialize(String),
}

/// A trained model bound to the window it was fit on.
pub trait Model: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, EstimatorError>;

    /// Serializes the model for the artifact store. Format is private to the
    /// estimator family that created the model.
    fn to_bytes(&self) -> Result<Vec<u8>, EstimatorError>;
}

/// A trainable estimator family.
///
/// `fit` must either return a usable model or fail; the engine never
/// substitutes a fallback for a failed fit.
pub trait Estimator: Send + Sync {
    /// Stable name, usable as a signature prefix component.
    fn name(&self) -> &str;

    fn fit(&self, rows: &[FeatureRecord]) -> Result<Box<dyn Model>, EstimatorError>;

    /// Revives a model previously serialized by `Model::to_bytes` of the same
    /// estimator family.
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EstimatorError>;
}
