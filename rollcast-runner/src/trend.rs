//! Coarse-grid channel-midline trend, served on the fine grid.
//!
//! The trend is the midline of a rolling high/low channel computed on coarse
//! bars, projected back onto the fine grid through `decompress`. Both the
//! coarse aggregation and the projected series are memoized per source.

use std::sync::Arc;

use rollcast_core::{compress, decompress, difference, Bar, CacheKey, Interval, MemoCache};

use crate::features::{rolling_max, rolling_min};

/// Channel-midline trend for `bars`, projected from the `coarse` grid onto the
/// `fine` grid. The output has one value per input bar.
pub fn calc_trend(
    cache: &MemoCache,
    source: &str,
    bars: &[Bar],
    fine: Interval,
    coarse: Interval,
    period: u32,
) -> Arc<Vec<f64>> {
    let key = CacheKey::new(
        "trend.midline",
        [
            source.to_string(),
            fine.minutes().to_string(),
            coarse.minutes().to_string(),
            period.to_string(),
        ],
    );
    cache.get_or_compute(&key, || {
        let coarse_key = CacheKey::new(
            "bars.compressed",
            [source.to_string(), coarse.minutes().to_string()],
        );
        let coarse_bars = cache.get_or_compute(&coarse_key, || compress(bars, coarse));

        let highs: Vec<f64> = coarse_bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = coarse_bars.iter().map(|b| b.low).collect();
        let upper = rolling_max(&highs, period);
        let lower = rolling_min(&lows, period);

        let mut midline = cache.get_array(coarse_bars.len());
        for i in 0..coarse_bars.len() {
            midline[i] = 0.5 * (upper[i] + lower[i]);
        }
        let diff = difference(&midline);
        let projected = decompress(bars, fine, &midline, &diff, coarse, &coarse_bars);
        cache.recycle(midline);
        projected
    })
}
