//! Parallel parameter sweep over lifecycle configurations.
//!
//! Trials share one `MemoCache` (feature records and finished trial scores
//! are reused across configs) and one artifact store, so a sweep re-run after
//! an interruption revives every model it already trained and skips every
//! trial it already scored.

use rayon::prelude::*;
use tracing::info;

use rollcast_core::{
    segment_records, ArtifactStore, Bar, CacheKey, Estimator, FeatureRecord, MemoCache,
};

use crate::config::ForecastConfig;
use crate::features::{build_records, LabelSide};
use crate::router::Forecaster;

/// Cartesian grid of the lifecycle tunables a sweep varies.
///
/// `history_bars` and `preview_bars` come from the base config; varying them
/// invalidates the feature records, which is a different kind of experiment.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub train_days: Vec<u32>,
    pub retrain_minutes: Vec<u32>,
    pub last_models: Vec<u32>,
}

impl ParamGrid {
    /// Coarse default grid spanning the documented tunable ranges.
    pub fn lifecycle_default() -> Self {
        Self {
            train_days: vec![5, 10, 20, 40],
            retrain_minutes: vec![5, 60, 1440],
            last_models: vec![3, 5, 12, 24],
        }
    }

    pub fn size(&self) -> usize {
        self.train_days.len() * self.retrain_minutes.len() * self.last_models.len()
    }

    /// Expands the grid against `base`, keeping its feature parameters.
    pub fn generate_configs(&self, base: &ForecastConfig) -> Vec<ForecastConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &train_days in &self.train_days {
            for &retrain_minutes in &self.retrain_minutes {
                for &last_models in &self.last_models {
                    configs.push(ForecastConfig {
                        train_days,
                        retrain_minutes,
                        last_models,
                        ..base.clone()
                    });
                }
            }
        }
        configs
    }
}

/// One scored trial. Lower is better.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub config: ForecastConfig,
    /// RMSE of the forecast against the realized label, over the slots the
    /// lifecycle actually served. `INFINITY` when nothing was served.
    pub score: f64,
}

/// Key prefix isolating one (source, estimator, feature-shape, side) family
/// of model artifacts. Lifecycle parameters live in the `ModelKey` itself.
fn artifact_prefix(source: &str, estimator: &dyn Estimator, config: &ForecastConfig, side: LabelSide) -> String {
    format!(
        "{}.{}.{}.h{}.p{}",
        source,
        estimator.name(),
        side.as_str(),
        config.history_bars,
        config.preview_bars,
    )
}

/// Memo key of one trial's score: the configuration's content signature
/// scoped to the data source, estimator, and label side.
fn trial_key(
    source: &str,
    estimator: &dyn Estimator,
    side: LabelSide,
    config: &ForecastConfig,
) -> CacheKey {
    CacheKey::new(
        "sweep.trial",
        [
            source.to_string(),
            estimator.name().to_string(),
            side.as_str().to_string(),
            config.run_signature(),
        ],
    )
}

/// Runs every configuration in `grid` over `bars` and returns the outcomes
/// sorted best-first. Trial scores are memoized in `cache` under the config's
/// `run_signature()`, so repeated sweeps over a shared cache skip finished
/// trials entirely.
#[allow(clippy::too_many_arguments)]
pub fn run_sweep(
    grid: &ParamGrid,
    base: &ForecastConfig,
    bars: &[Bar],
    source: &str,
    side: LabelSide,
    estimator: &dyn Estimator,
    store: &dyn ArtifactStore,
    cache: &MemoCache,
) -> anyhow::Result<Vec<SweepOutcome>> {
    let configs = grid.generate_configs(base);
    info!(trials = configs.len(), source, side = side.as_str(), "starting sweep");

    let mut outcomes: Vec<SweepOutcome> = configs
        .into_par_iter()
        .map(|config| -> anyhow::Result<SweepOutcome> {
            let score_key = trial_key(source, estimator, side, &config);
            if let Some(score) = cache.get::<f64>(&score_key) {
                return Ok(SweepOutcome { config, score: *score });
            }
            let records = build_records(cache, source, bars, &config, side);
            let prefix = artifact_prefix(source, estimator, &config, side);
            let forecaster = Forecaster::new(estimator, store, config.clone())?;
            let forecast = forecaster.build(&prefix, &records, |p| p.score)?;
            let score =
                *cache.get_or_compute(&score_key, || served_rmse(&forecast, &records, &config));
            Ok(SweepOutcome { config, score })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    outcomes.sort_by(|a, b| a.score.total_cmp(&b.score));
    if let Some(best) = outcomes.first() {
        info!(score = best.score, config = ?best.config, "sweep finished");
    }
    Ok(outcomes)
}

/// RMSE over the span the lifecycle actually served.
///
/// The served span is derived from the segment layout: everything up to and
/// including the first trained segment is zero-filled by construction and
/// excluded, everything after it is scored — including slots where a model
/// legitimately predicted 0. `INFINITY` when nothing was served.
fn served_rmse(forecast: &[f64], records: &[FeatureRecord], config: &ForecastConfig) -> f64 {
    let segments = segment_records(records, config.retrain_interval());
    if segments.len() < 2 {
        return f64::INFINITY;
    }
    let num_models = segments.len() - 1;
    let first_trained = num_models.saturating_sub(config.last_models as usize);
    let served_from: usize = segments[..=first_trained].iter().map(|s| s.len()).sum();

    let span = &forecast[served_from..];
    if span.is_empty() {
        return f64::INFINITY;
    }
    let mut squared = 0.0;
    for (value, record) in span.iter().zip(&records[served_from..]) {
        squared += (value - record.label).powi(2);
    }
    (squared / span.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_bars;
    use crate::estimators::MeanEstimator;
    use crate::testutil::CountingEstimator;
    use rollcast_core::{Interval, MemoryStore};

    fn small_grid() -> ParamGrid {
        ParamGrid {
            train_days: vec![2, 3],
            retrain_minutes: vec![1440],
            last_models: vec![2],
        }
    }

    fn base_config() -> ForecastConfig {
        ForecastConfig {
            history_bars: 5,
            preview_bars: 2,
            retrain_minutes: 1440,
            train_days: 2,
            last_models: 2,
        }
    }

    #[test]
    fn grid_expansion_matches_size() {
        let grid = ParamGrid::lifecycle_default();
        let configs = grid.generate_configs(&ForecastConfig::default());
        assert_eq!(configs.len(), grid.size());
        assert!(configs.iter().all(|c| c.validate().is_ok()));
        // Feature parameters are inherited from the base.
        assert!(configs
            .iter()
            .all(|c| c.history_bars == ForecastConfig::default().history_bars));
    }

    #[test]
    fn outcomes_are_sorted_best_first() {
        let bars = synthetic_bars(6 * 48, Interval::from_minutes(30), 9);
        let store = MemoryStore::new();
        let cache = MemoCache::new();
        let outcomes = run_sweep(
            &small_grid(),
            &base_config(),
            &bars,
            "synthetic",
            LabelSide::High,
            &MeanEstimator,
            &store,
            &cache,
        )
        .unwrap();
        assert_eq!(outcomes.len(), small_grid().size());
        for pair in outcomes.windows(2) {
            assert!(pair[0].score.total_cmp(&pair[1].score).is_le());
        }
    }

    #[test]
    fn rerun_revives_every_artifact() {
        let bars = synthetic_bars(6 * 48, Interval::from_minutes(30), 9);
        let store = MemoryStore::new();
        let estimator = CountingEstimator::default();

        // Fresh caches per run: only the artifact store carries over, as it
        // would across processes.
        run_sweep(
            &small_grid(),
            &base_config(),
            &bars,
            "synthetic",
            LabelSide::High,
            &estimator,
            &store,
            &MemoCache::new(),
        )
        .unwrap();
        let fits = estimator.fit_count();
        assert!(fits > 0);

        run_sweep(
            &small_grid(),
            &base_config(),
            &bars,
            "synthetic",
            LabelSide::High,
            &estimator,
            &store,
            &MemoCache::new(),
        )
        .unwrap();
        assert_eq!(estimator.fit_count(), fits, "second sweep must only load");
    }

    #[test]
    fn shared_cache_memoizes_trial_scores() {
        let bars = synthetic_bars(6 * 48, Interval::from_minutes(30), 9);
        let store = MemoryStore::new();
        let estimator = CountingEstimator::default();
        let cache = MemoCache::new();

        let first = run_sweep(
            &small_grid(),
            &base_config(),
            &bars,
            "synthetic",
            LabelSide::High,
            &estimator,
            &store,
            &cache,
        )
        .unwrap();
        let fits = estimator.fit_count();
        let loads = estimator.loads.load(std::sync::atomic::Ordering::SeqCst);

        // With the score memo hit the trial short-circuits before touching
        // the store, so neither fits nor loads may grow.
        let second = run_sweep(
            &small_grid(),
            &base_config(),
            &bars,
            "synthetic",
            LabelSide::High,
            &estimator,
            &store,
            &cache,
        )
        .unwrap();
        assert_eq!(estimator.fit_count(), fits);
        assert_eq!(
            estimator.loads.load(std::sync::atomic::Ordering::SeqCst),
            loads
        );
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.config, b.config);
            assert_eq!(a.score, b.score);
        }
    }

    /// One record every 12 hours over 3 days, daily retrain grid, label 1.0.
    fn half_day_records() -> Vec<FeatureRecord> {
        synthetic_bars(6, Interval::from_minutes(720), 1)
            .iter()
            .map(|b| FeatureRecord::new(b.timestamp, vec![0.0], 1.0))
            .collect()
    }

    #[test]
    fn served_span_follows_first_trained_segment() {
        let records = half_day_records();
        let config = base_config(); // last_models = 2, daily retrain

        // 3 segments, 2 retrain points, both trained: the span starts after
        // segment 0 and a legitimate 0.0 prediction inside it is scored.
        let score = served_rmse(&[9.0, 9.0, 0.0, 2.0, 0.0, 2.0], &records, &config);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn served_span_shrinks_with_the_model_floor() {
        let records = half_day_records();
        let mut config = base_config();
        config.last_models = 1;

        // Only the last retrain point is trained; segments 0 and 1 are
        // zero-filled and excluded, so only the final two slots are scored.
        let score = served_rmse(&[0.0, 0.0, 0.0, 0.0, 2.0, 0.0], &records, &config);
        let expected = ((1.0f64 + 1.0) / 2.0).sqrt();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn unserved_stream_scores_infinite() {
        let records = half_day_records();
        // A single segment has no retrain point and serves nothing.
        let short = &records[..2];
        assert!(served_rmse(&[0.0, 0.0], short, &base_config()).is_infinite());
    }
}
