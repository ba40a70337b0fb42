//! Rollcast Core — rolling-forecast engine primitives.
//!
//! This crate contains the time-grid machinery that every forecast pipeline
//! builds on:
//! - Domain types (bars, feature records, segments, predictions)
//! - Resolution descriptors with calendar alignment
//! - Temporal segmentation of feature streams into retrain blocks
//! - Coarse↔fine resolution transforms (compress/decompress)
//! - Estimator and model contracts (training backends plug in behind them)
//! - Typed keyed memoization and the model artifact store contract

pub mod cache;
pub mod domain;
pub mod estimator;
pub mod interval;
pub mod resample;
pub mod segmenter;
pub mod store;

pub use cache::{CacheKey, MemoCache};
pub use domain::{Bar, FeatureRecord, Prediction, Segment};
pub use estimator::{Estimator, EstimatorError, Model};
pub use interval::Interval;
pub use resample::{compress, decompress, difference};
pub use segmenter::segment_records;
pub use store::{ArtifactStore, MemoryStore, ModelArtifact, ModelKey, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the sweep worker boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::FeatureRecord>();
        require_sync::<domain::FeatureRecord>();
        require_send::<domain::Segment>();
        require_sync::<domain::Segment>();
        require_send::<interval::Interval>();
        require_sync::<interval::Interval>();
        require_send::<store::ModelKey>();
        require_sync::<store::ModelKey>();
        require_send::<store::ModelArtifact>();
        require_sync::<store::ModelArtifact>();
        require_send::<store::MemoryStore>();
        require_sync::<store::MemoryStore>();
        require_send::<cache::MemoCache>();
        require_sync::<cache::MemoCache>();
    }
}
