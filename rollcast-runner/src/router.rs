//! Prediction router — walks forward through segments and emits one scalar per bar.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use rollcast_core::{
    segment_records, ArtifactStore, Estimator, EstimatorError, FeatureRecord, Prediction,
};

use crate::config::{ConfigError, ForecastConfig};
use crate::trainer::{RollingTrainer, TrainError, TrainedEngine};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error("prediction failed at {timestamp}: {source}")]
    Predict {
        timestamp: NaiveDateTime,
        #[source]
        source: EstimatorError,
    },
}

/// Runs the full rolling-forecast lifecycle over one feature stream.
///
/// A `build` call is synchronous and single-threaded: segmentation, training
/// and prediction run sequentially, and the engine map lives only for the
/// duration of the call. Concurrent evaluations are expected to run as
/// independent `Forecaster`s.
pub struct Forecaster<'a> {
    estimator: &'a dyn Estimator,
    store: &'a dyn ArtifactStore,
    config: ForecastConfig,
}

impl<'a> Forecaster<'a> {
    /// Fails fast on an invalid configuration, before any training attempt.
    pub fn new(
        estimator: &'a dyn Estimator,
        store: &'a dyn ArtifactStore,
        config: ForecastConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            estimator,
            store,
            config,
        })
    }

    /// Produces one projected forecast per input record, in input order.
    ///
    /// The first segment is never predicted (no prior model can exist) and
    /// fills with 0. Older segments beyond the `last_models` serving window
    /// also fill with 0 and cost no training. For every other bar the latest
    /// engine whose cutoff does not exceed the bar's model-change timestamp is
    /// invoked; if none exists yet, 0 is emitted.
    pub fn build<F>(
        &self,
        key_prefix: &str,
        records: &[FeatureRecord],
        projection: F,
    ) -> Result<Vec<f64>, BuildError>
    where
        F: Fn(&Prediction) -> f64,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let retrain = self.config.retrain_interval();
        let segments = segment_records(records, retrain);
        let trainer = RollingTrainer::new(
            self.estimator,
            self.store,
            retrain,
            self.config.train_days,
            key_prefix,
        );
        debug!(
            key = key_prefix,
            segments = segments.len(),
            records = records.len(),
            "start forecast build"
        );

        let mut out: Vec<f64> = Vec::with_capacity(records.len());
        out.resize(segments[0].len(), 0.0);

        // Engine map scoped to this call; never promoted to shared state.
        let mut engines: BTreeMap<NaiveDateTime, TrainedEngine> = BTreeMap::new();
        let num_models = segments.len() - 1;
        let last_models = self.config.last_models as usize;
        let preview = self.config.preview_bars as usize;

        for index in 0..num_models {
            if index + last_models < num_models {
                // Outside the serving window: neutral output, no training.
                let span = segments[index + 1].len();
                out.resize(out.len() + span, 0.0);
                continue;
            }

            let engine = trainer.train_or_reuse(&segments, index)?;
            engines.insert(engine.cutoff, engine);

            for record in &segments[index + 1].records {
                // The model-change timestamp of the slot being filled: the
                // aligned boundary of the bar `preview` positions back,
                // advanced by one retrain interval. The offset keeps a label
                // that peeks `preview` bars ahead from selecting a model fit
                // past its own horizon.
                let pos = out.len().saturating_sub(preview);
                let boundary = retrain.align(records[pos].timestamp) + retrain.shift();
                match engines.range(..=boundary).next_back() {
                    None => out.push(0.0),
                    Some((_, engine)) => {
                        let prediction =
                            engine
                                .predict(record)
                                .map_err(|source| BuildError::Predict {
                                    timestamp: record.timestamp,
                                    source,
                                })?;
                        out.push(projection(&prediction));
                    }
                }
            }
        }

        debug!(key = key_prefix, values = out.len(), "forecast build done");
        debug_assert_eq!(out.len(), records.len());
        Ok(out)
    }
}
