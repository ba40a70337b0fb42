//! Temporal segmenter — partitions a feature stream into calendar-aligned blocks.

use crate::domain::{FeatureRecord, Segment};
use crate::interval::Interval;

/// Groups an ordered feature stream into contiguous segments, one per aligned
/// date on the `interval` grid.
///
/// A new segment opens whenever a record's aligned date differs from the
/// previous record's; boundaries depend only on timestamps, never on record
/// content. The trailing partial segment (not yet closed by a date change) is
/// always emitted. Concatenating the output reproduces the input exactly.
pub fn segment_records(records: &[FeatureRecord], interval: Interval) -> Vec<Segment> {
    let mut segments = Vec::new();
    let Some(first) = records.first() else {
        return segments;
    };

    let mut cutoff = interval.align(first.timestamp);
    let mut current: Vec<FeatureRecord> = Vec::new();
    for record in records {
        let aligned = interval.align(record.timestamp);
        if aligned != cutoff && !current.is_empty() {
            segments.push(Segment {
                cutoff,
                records: std::mem::take(&mut current),
            });
        }
        if current.is_empty() {
            cutoff = aligned;
        }
        current.push(record.clone());
    }
    if !current.is_empty() {
        segments.push(Segment {
            cutoff,
            records: current,
        });
    }

    segments
}
