//! Random-forest regressor on top of smartcore.

use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use rollcast_core::{Estimator, EstimatorError, FeatureRecord, Model, Prediction};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random-forest estimator. The defaults are sized for five-minute bars with
/// a handful of features; sweeps vary the lifecycle parameters, not these.
#[derive(Debug, Clone, Copy)]
pub struct ForestEstimator {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for ForestEstimator {
    fn default() -> Self {
        Self {
            n_trees: 64,
            max_depth: 8,
            min_samples_split: 4,
        }
    }
}

pub struct ForestModel {
    forest: Forest,
}

impl Model for ForestModel {
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, EstimatorError> {
        let x = DenseMatrix::from_2d_vec(&vec![record.features.clone()])
            .map_err(|e| EstimatorError::Predict(e.to_string()))?;
        let scores = self
            .forest
            .predict(&x)
            .map_err(|e| EstimatorError::Predict(e.to_string()))?;
        let score = scores
            .first()
            .copied()
            .ok_or_else(|| EstimatorError::Predict("empty prediction batch".to_string()))?;
        Ok(Prediction { score })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EstimatorError> {
        serde_json::to_vec(&self.forest).map_err(|e| EstimatorError::Serialize(e.to_string()))
    }
}

impl Estimator for ForestEstimator {
    fn name(&self) -> &str {
        "forest"
    }

    fn fit(&self, rows: &[FeatureRecord]) -> Result<Box<dyn Model>, EstimatorError> {
        if rows.is_empty() {
            return Err(EstimatorError::EmptyTrainingWindow);
        }
        let x: Vec<Vec<f64>> = rows.iter().map(|r| r.features.clone()).collect();
        let y: Vec<f64> = rows.iter().map(|r| r.label).collect();
        let x = DenseMatrix::from_2d_vec(&x).map_err(|e| EstimatorError::Fit(e.to_string()))?;
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split);
        let forest =
            Forest::fit(&x, &y, params).map_err(|e| EstimatorError::Fit(e.to_string()))?;
        Ok(Box::new(ForestModel { forest }))
    }

    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EstimatorError> {
        let forest: Forest =
            serde_json::from_slice(bytes).map_err(|e| EstimatorError::Deserialize(e.to_string()))?;
        Ok(Box::new(ForestModel { forest }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Labels follow the first feature, so even a small forest should rank
    /// a high-feature row above a low-feature row.
    fn linear_rows(n: usize) -> Vec<FeatureRecord> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let v = i as f64;
                FeatureRecord::new(
                    base + Duration::minutes(5 * i as i64),
                    vec![v, -v, (v * 0.5).sin()],
                    2.0 * v,
                )
            })
            .collect()
    }

    #[test]
    fn learns_a_monotone_signal() {
        let rows = linear_rows(60);
        let model = ForestEstimator::default().fit(&rows).unwrap();
        let low = model.predict(&rows[2]).unwrap().score;
        let high = model.predict(&rows[57]).unwrap().score;
        assert!(high > low, "expected {high} > {low}");
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(matches!(
            ForestEstimator::default().fit(&[]),
            Err(EstimatorError::EmptyTrainingWindow)
        ));
    }

    #[test]
    fn bytes_roundtrip_preserves_predictions() {
        let rows = linear_rows(40);
        let estimator = ForestEstimator::default();
        let model = estimator.fit(&rows).unwrap();
        let revived = estimator.load(&model.to_bytes().unwrap()).unwrap();
        for row in rows.iter().step_by(7) {
            assert_eq!(
                model.predict(row).unwrap().score,
                revived.predict(row).unwrap().score
            );
        }
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        assert!(ForestEstimator::default().load(&[0xff, 0x00]).is_err());
    }
}
