//! Feature records and inference results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One training/inference row, produced once per bar by a feature builder and
/// immutable thereafter.
///
/// `features` has the same length for every record in a stream. `label` is the
/// training target; inference ignores it. `weight` optionally scales a row's
/// influence during training (estimators without weight support ignore it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub timestamp: NaiveDateTime,
    pub features: Vec<f64>,
    pub label: f64,
    pub weight: Option<f64>,
}

impl FeatureRecord {
    pub fn new(timestamp: NaiveDateTime, features: Vec<f64>, label: f64) -> Self {
        Self {
            timestamp,
            features,
            label,
            weight: None,
        }
    }
}

/// Opaque structured output of one inference call.
///
/// Callers supply a projection `Fn(&Prediction) -> f64` to obtain the final
/// scalar written to the output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub score: f64,
}
