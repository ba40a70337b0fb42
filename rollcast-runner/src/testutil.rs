//! Shared fixtures for the trainer/router unit tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rollcast_core::{Estimator, EstimatorError, FeatureRecord, Model, Prediction, Segment};

pub fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// `days` daily segments with `per_day` five-minute records each; the label
/// equals the day index.
pub fn daily_segments(days: usize, per_day: usize) -> Vec<Segment> {
    (0..days)
        .map(|d| {
            let cutoff = base() + Duration::days(d as i64);
            let records = (0..per_day)
                .map(|i| {
                    FeatureRecord::new(
                        cutoff + Duration::minutes(5 * i as i64),
                        vec![d as f64, i as f64],
                        d as f64,
                    )
                })
                .collect();
            Segment { cutoff, records }
        })
        .collect()
}

pub struct MeanLabelModel {
    pub mean: f64,
}

impl Model for MeanLabelModel {
    fn predict(&self, _record: &FeatureRecord) -> Result<Prediction, EstimatorError> {
        Ok(Prediction { score: self.mean })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EstimatorError> {
        Ok(self.mean.to_le_bytes().to_vec())
    }
}

/// Fake estimator that counts fits/loads and records what each fit saw.
#[derive(Default)]
pub struct CountingEstimator {
    pub fits: AtomicUsize,
    pub loads: AtomicUsize,
    /// `(max record timestamp, row count)` per fit call, in call order.
    pub trained_spans: Mutex<Vec<(NaiveDateTime, usize)>>,
}

impl CountingEstimator {
    pub fn fit_count(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

impl Estimator for CountingEstimator {
    fn name(&self) -> &str {
        "counting"
    }

    fn fit(&self, rows: &[FeatureRecord]) -> Result<Box<dyn Model>, EstimatorError> {
        if rows.is_empty() {
            return Err(EstimatorError::EmptyTrainingWindow);
        }
        self.fits.fetch_add(1, Ordering::SeqCst);
        let max_ts = rows.iter().map(|r| r.timestamp).max().unwrap();
        self.trained_spans
            .lock()
            .unwrap()
            .push((max_ts, rows.len()));
        let mean = rows.iter().map(|r| r.label).sum::<f64>() / rows.len() as f64;
        Ok(Box::new(MeanLabelModel { mean }))
    }

    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EstimatorError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| EstimatorError::Deserialize("expected 8 bytes".to_string()))?;
        Ok(Box::new(MeanLabelModel {
            mean: f64::from_le_bytes(raw),
        }))
    }
}

/// Estimator whose fit always fails.
pub struct FailingEstimator;

impl Estimator for FailingEstimator {
    fn name(&self) -> &str {
        "failing"
    }

    fn fit(&self, _rows: &[FeatureRecord]) -> Result<Box<dyn Model>, EstimatorError> {
        Err(EstimatorError::Fit("forced failure".to_string()))
    }

    fn load(&self, _bytes: &[u8]) -> Result<Box<dyn Model>, EstimatorError> {
        Err(EstimatorError::Deserialize("forced failure".to_string()))
    }
}
