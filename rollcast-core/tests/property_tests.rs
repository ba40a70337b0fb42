//! Property tests for the segmenter and the resolution transforms.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rollcast_core::{compress, decompress, segment_records, Bar, FeatureRecord, Interval};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn minute_bar(offset: i64) -> Bar {
    Bar {
        timestamp: base() + Duration::minutes(offset),
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close: 100.5,
        volume: 1.0,
    }
}

proptest! {
    /// Concatenating all segments reproduces the input exactly, and cutoffs
    /// strictly increase for ordered input.
    #[test]
    fn segmenter_partitions_exactly(
        offsets in proptest::collection::vec(0u32..10 * 1440, 0..300)
    ) {
        let mut offsets = offsets;
        offsets.sort_unstable();
        let records: Vec<FeatureRecord> = offsets
            .iter()
            .enumerate()
            .map(|(i, m)| {
                FeatureRecord::new(base() + Duration::minutes(i64::from(*m)), vec![i as f64], 0.0)
            })
            .collect();

        let segments = segment_records(&records, Interval::DAY);

        let rebuilt: Vec<FeatureRecord> = segments
            .iter()
            .flat_map(|s| s.records.clone())
            .collect();
        prop_assert_eq!(&rebuilt, &records);

        for pair in segments.windows(2) {
            prop_assert!(pair[0].cutoff < pair[1].cutoff);
        }
        if let (Some(first_rec), Some(first_seg)) = (records.first(), segments.first()) {
            prop_assert_eq!(first_seg.cutoff, Interval::DAY.align(first_rec.timestamp));
        }
    }

    /// Decompress always produces one value per fine bar, whatever the grids.
    #[test]
    fn decompress_length_matches_fine_grid(
        bars in 0usize..2000,
        coarse_minutes in prop::sample::select(vec![60u32, 240, 1440])
    ) {
        let fine_bars: Vec<Bar> = (0..bars).map(|i| minute_bar(i as i64)).collect();
        let coarse = Interval::from_minutes(coarse_minutes);
        let coarse_bars = compress(&fine_bars, coarse);
        let signal: Vec<f64> = (0..coarse_bars.len()).map(|i| i as f64).collect();
        let diff: Vec<f64> = vec![0.5; coarse_bars.len()];

        let out = decompress(
            &fine_bars,
            Interval::from_minutes(1),
            &signal,
            &diff,
            coarse,
            &coarse_bars,
        );
        prop_assert_eq!(out.len(), fine_bars.len());
    }
}
