//! Weighted-mean baseline. Useful as a sanity floor when comparing sweeps.

use serde::{Deserialize, Serialize};

use rollcast_core::{Estimator, EstimatorError, FeatureRecord, Model, Prediction};

/// Predicts the (weight-adjusted) mean label of its training window,
/// ignoring features entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanEstimator;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MeanModel {
    mean: f64,
}

impl Model for MeanModel {
    fn predict(&self, _record: &FeatureRecord) -> Result<Prediction, EstimatorError> {
        Ok(Prediction { score: self.mean })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EstimatorError> {
        serde_json::to_vec(self).map_err(|e| EstimatorError::Serialize(e.to_string()))
    }
}

impl Estimator for MeanEstimator {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&self, rows: &[FeatureRecord]) -> Result<Box<dyn Model>, EstimatorError> {
        if rows.is_empty() {
            return Err(EstimatorError::EmptyTrainingWindow);
        }
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        for row in rows {
            let w = row.weight.unwrap_or(1.0);
            total += row.label * w;
            weight_sum += w;
        }
        if weight_sum == 0.0 {
            return Err(EstimatorError::Fit("all training weights are zero".to_string()));
        }
        Ok(Box::new(MeanModel {
            mean: total / weight_sum,
        }))
    }

    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EstimatorError> {
        let model: MeanModel =
            serde_json::from_slice(bytes).map_err(|e| EstimatorError::Deserialize(e.to_string()))?;
        Ok(Box::new(model))
    }
}
