//! Lifecycle configuration: explicit tunables with bounds.
//!
//! Each tunable carries an explicit optimizer range (`ParamRange`); the sweep
//! driver enumerates configurations from these ranges instead of discovering
//! parameters reflectively at runtime. `validate()` enforces the hard floors
//! before any training is attempted.

use rollcast_core::Interval;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Inclusive optimizer range for one integer tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl ParamRange {
    /// Enumerates the range. A zero step is treated as 1.
    pub fn values(&self) -> Vec<u32> {
        let step = self.step.max(1);
        (self.min..=self.max).step_by(step as usize).collect()
    }
}

/// Tunables of one forecast evaluation.
///
/// Defaults and ranges follow the original handler parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Feature lookback in bars.
    pub history_bars: u32,
    /// Label look-ahead in bars; also offsets causal model selection.
    pub preview_bars: u32,
    /// Retrain grid: one segment (and one retrain point) per this many minutes.
    pub retrain_minutes: u32,
    /// Trailing training window span in calendar days.
    pub train_days: u32,
    /// Only the most recent `last_models` retrain points are trained and
    /// served; older history gets neutral output.
    pub last_models: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_bars: 20,
            preview_bars: 5,
            retrain_minutes: 5,
            train_days: 20,
            last_models: 5,
        }
    }
}

impl ForecastConfig {
    pub const HISTORY_BARS_RANGE: ParamRange = ParamRange { min: 5, max: 50, step: 5 };
    pub const PREVIEW_BARS_RANGE: ParamRange = ParamRange { min: 1, max: 20, step: 1 };
    pub const RETRAIN_MINUTES_RANGE: ParamRange = ParamRange { min: 1, max: 24, step: 1 };
    pub const TRAIN_DAYS_RANGE: ParamRange = ParamRange { min: 1, max: 50, step: 1 };
    pub const LAST_MODELS_RANGE: ParamRange = ParamRange { min: 1, max: 24, step: 1 };

    /// Hard floors, checked before any training starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_bars < 4 {
            return Err(ConfigError::BelowFloor {
                field: "history_bars",
                floor: 4,
                got: self.history_bars,
            });
        }
        if self.preview_bars < 1 {
            return Err(ConfigError::BelowFloor {
                field: "preview_bars",
                floor: 1,
                got: self.preview_bars,
            });
        }
        if self.retrain_minutes < 1 {
            return Err(ConfigError::BelowFloor {
                field: "retrain_minutes",
                floor: 1,
                got: self.retrain_minutes,
            });
        }
        if self.train_days < 1 {
            return Err(ConfigError::BelowFloor {
                field: "train_days",
                floor: 1,
                got: self.train_days,
            });
        }
        if self.last_models < 1 {
            return Err(ConfigError::BelowFloor {
                field: "last_models",
                floor: 1,
                got: self.last_models,
            });
        }
        Ok(())
    }

    pub fn retrain_interval(&self) -> Interval {
        Interval::from_minutes(self.retrain_minutes)
    }

    /// Deterministic content hash of this configuration (BLAKE3 of canonical
    /// JSON); the sweep driver memoizes trial scores under it, so two
    /// identical configs share one scored trial.
    pub fn run_signature(&self) -> String {
        let json = serde_json::to_string(self).expect("ForecastConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Loads and validates a config from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {floor} (got {got})")]
    BelowFloor {
        field: &'static str,
        floor: u32,
        got: u32,
    },
    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}
