//! Rollcast Runner — rolling-forecast orchestration on top of `rollcast-core`.
//!
//! This crate provides:
//! - Validated lifecycle configuration with tunable bounds
//! - The rolling trainer/cache manager (one model per retrain point)
//! - The prediction router (`Forecaster::build`, one scalar per bar)
//! - A persistent on-disk artifact store
//! - Concrete estimators (smartcore random forest, mean baseline)
//! - CSV/synthetic bar sources and the feature/label builder
//! - A coarse-grid trend signal served through `decompress`
//! - A rayon-parallel parameter sweep driver

pub mod config;
pub mod data;
pub mod estimators;
pub mod features;
pub mod router;
pub mod store;
pub mod sweep;
pub mod trainer;
pub mod trend;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{ConfigError, ForecastConfig, ParamRange};
pub use data::{load_bars, synthetic_bars, write_bars, LoadError};
pub use estimators::{ForestEstimator, MeanEstimator};
pub use features::{build_records, LabelSide};
pub use router::{BuildError, Forecaster};
pub use store::DiskStore;
pub use sweep::{run_sweep, ParamGrid, SweepOutcome};
pub use trainer::{assemble_window, RollingTrainer, TrainError, TrainedEngine};
pub use trend::calc_trend;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sweep_boundary_types_are_send_sync() {
        assert_send::<ForecastConfig>();
        assert_sync::<ForecastConfig>();
        assert_send::<DiskStore>();
        assert_sync::<DiskStore>();
        assert_send::<ForestEstimator>();
        assert_sync::<ForestEstimator>();
        assert_send::<MeanEstimator>();
        assert_sync::<MeanEstimator>();
        assert_send::<SweepOutcome>();
        assert_sync::<SweepOutcome>();
    }
}
