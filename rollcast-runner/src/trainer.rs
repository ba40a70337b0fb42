//! Rolling trainer/cache manager — one model per retrain point.
//!
//! For a segment boundary the trainer assembles the trailing window of prior
//! segments, reuses a cached artifact when its signature and row count match,
//! and otherwise fits a fresh model and persists it. The held-out next segment
//! is only ever touched for diagnostics, never for training.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, warn};

use rollcast_core::{
    ArtifactStore, Estimator, EstimatorError, FeatureRecord, Interval, Model, ModelArtifact,
    ModelKey, Prediction, Segment, StoreError,
};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("estimator failed on {key} ({rows} rows): {source}")]
    Fit {
        key: String,
        rows: usize,
        #[source]
        source: EstimatorError,
    },
    #[error("model for {key} could not be serialized: {source}")]
    Serialize {
        key: String,
        #[source]
        source: EstimatorError,
    },
    #[error("artifact store failed on {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// An in-memory prediction engine bound to one trained model.
///
/// `cutoff` is the segment boundary the model was trained at; the router uses
/// it to pick the causally valid engine for a bar. Engines live for one
/// `build` invocation and are never persisted.
pub struct TrainedEngine {
    pub cutoff: NaiveDateTime,
    model: Box<dyn Model>,
}

impl std::fmt::Debug for TrainedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedEngine")
            .field("cutoff", &self.cutoff)
            .finish_non_exhaustive()
    }
}

impl TrainedEngine {
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction, EstimatorError> {
        self.model.predict(record)
    }
}

/// Assembles the trailing training window for `segments[index]`.
///
/// Starting from the segment's own records, older segments are appended until
/// either the block bound (`train_days` worth of retrain intervals) or the
/// elapsed-days bound (truncated whole days reaching `train_days`) hits —
/// whichever comes first. This is an approximate day-count window, not an
/// exact record count, and both bounds are preserved as-is.
pub fn assemble_window(
    segments: &[Segment],
    index: usize,
    train_days: u32,
    retrain: Interval,
) -> Vec<FeatureRecord> {
    let current = &segments[index];
    let mut window = current.records.clone();

    let max_blocks = (f64::from(train_days) * 24.0 * 60.0 / f64::from(retrain.minutes())).max(1.0);
    let mut k = 1usize;
    while (k as f64) < max_blocks
        && k <= index
        && (current.cutoff - segments[index - k].cutoff).num_days() < i64::from(train_days)
    {
        window.extend_from_slice(&segments[index - k].records);
        k += 1;
    }
    window
}

/// Trains or revives the model for one retrain point.
pub struct RollingTrainer<'a> {
    estimator: &'a dyn Estimator,
    store: &'a dyn ArtifactStore,
    retrain: Interval,
    train_days: u32,
    prefix: String,
}

impl<'a> RollingTrainer<'a> {
    pub fn new(
        estimator: &'a dyn Estimator,
        store: &'a dyn ArtifactStore,
        retrain: Interval,
        train_days: u32,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            estimator,
            store,
            retrain,
            train_days,
            prefix: prefix.into(),
        }
    }

    /// Returns the prediction engine for `segments[index]`, reusing the cached
    /// artifact when its row count matches the freshly assembled window.
    ///
    /// Any mismatch — missing artifact, stale row count, or a blob the
    /// estimator cannot revive — silently retrains; that is the designed
    /// self-healing path, not a fault. A failed fit is terminal.
    pub fn train_or_reuse(
        &self,
        segments: &[Segment],
        index: usize,
    ) -> Result<TrainedEngine, TrainError> {
        let cutoff = segments[index].cutoff;
        let key = ModelKey {
            prefix: self.prefix.clone(),
            retrain: self.retrain,
            train_days: self.train_days,
            cutoff,
        };
        let window = assemble_window(segments, index, self.train_days, self.retrain);

        let cached = self.store.load(&key).map_err(|source| TrainError::Store {
            key: key.to_string(),
            source,
        })?;
        if let Some(artifact) = cached {
            if artifact.rows == window.len() {
                match self.estimator.load(&artifact.bytes) {
                    Ok(model) => {
                        debug!(key = %key, rows = window.len(), "reusing cached model");
                        return Ok(TrainedEngine { cutoff, model });
                    }
                    Err(err) => {
                        // Indistinguishable from a stale artifact; retrain.
                        warn!(key = %key, error = %err, "cached model failed to load, retraining");
                    }
                }
            } else {
                debug!(
                    key = %key,
                    cached_rows = artifact.rows,
                    window_rows = window.len(),
                    "row count mismatch, retraining"
                );
            }
        }

        debug!(key = %key, rows = window.len(), "training model");
        let model = self
            .estimator
            .fit(&window)
            .map_err(|source| TrainError::Fit {
                key: key.to_string(),
                rows: window.len(),
                source,
            })?;
        let bytes = model.to_bytes().map_err(|source| TrainError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store
            .store(
                &key,
                &ModelArtifact {
                    rows: window.len(),
                    bytes,
                },
            )
            .map_err(|source| TrainError::Store {
                key: key.to_string(),
                source,
            })?;

        if cfg!(debug_assertions) {
            if let Some(holdout) = segments.get(index + 1) {
                if let Some(rmse) = holdout_rmse(model.as_ref(), &holdout.records) {
                    debug!(key = %key, holdout_rmse = rmse, "holdout diagnostics");
                }
            }
        }

        Ok(TrainedEngine { cutoff, model })
    }
}

/// RMSE over a held-out segment; `None` when empty or any prediction fails.
fn holdout_rmse(model: &dyn Model, rows: &[FeatureRecord]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let mut squared = 0.0;
    for row in rows {
        let prediction = model.predict(row).ok()?;
        squared += (prediction.score - row.label).powi(2);
    }
    Some((squared / rows.len() as f64).sqrt())
}
