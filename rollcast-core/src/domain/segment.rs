//! Segment — one calendar-aligned block of feature records.

use chrono::NaiveDateTime;

use super::FeatureRecord;

/// A contiguous run of feature records sharing one aligned date.
///
/// `cutoff` is the aligned timestamp identifying the block; it doubles as the
/// training boundary for the model produced at this block. Segments are
/// strictly ordered by cutoff and every record belongs to exactly one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub cutoff: NaiveDateTime,
    pub records: Vec<FeatureRecord>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
