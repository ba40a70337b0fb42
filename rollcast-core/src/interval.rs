//! Resolution descriptor for a bar grid.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A time grid resolution in whole minutes.
///
/// Used both for the retrain grid of the model lifecycle and for the
/// coarse/fine grids of the resolution transforms. 1440 minutes is the daily
/// grid (aligns to midnight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    minutes: u32,
}

impl Interval {
    /// Daily grid.
    pub const DAY: Interval = Interval { minutes: 1440 };

    pub fn from_minutes(minutes: u32) -> Self {
        debug_assert!(minutes >= 1, "interval must span at least one minute");
        Self { minutes }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Span of one interval.
    pub fn shift(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// Rounds `ts` down to the interval grid (anchored at the Unix epoch).
    ///
    /// Sub-second components are dropped as well, so aligned timestamps are
    /// stable signature inputs.
    pub fn align(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let span = i64::from(self.minutes) * 60;
        let utc = ts.and_utc();
        let excess = utc.timestamp().rem_euclid(span);
        ts - Duration::seconds(excess) - Duration::nanoseconds(i64::from(utc.timestamp_subsec_nanos()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes)
    }
}
