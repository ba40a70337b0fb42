//! Domain types: bars, feature records, segments, predictions.

mod bar;
mod record;
mod segment;

pub use bar::Bar;
pub use record::{FeatureRecord, Prediction};
pub use segment::Segment;
