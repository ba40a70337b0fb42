//! Concrete estimators behind the `Estimator` trait.

mod baseline;
mod forest;

pub use baseline::{MeanEstimator, MeanModel};
pub use forest::{ForestEstimator, ForestModel};
