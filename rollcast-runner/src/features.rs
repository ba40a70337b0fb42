//! Indicator features and excursion labels for one bar stream.

use std::sync::Arc;

use rollcast_core::{Bar, CacheKey, FeatureRecord, MemoCache};

use crate::config::ForecastConfig;

/// Which excursion the label tracks.
///
/// `High` labels the best upward excursion over the preview window, `Low` the
/// worst downward one negated, so a larger label is always "more favorable"
/// and one model shape serves both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelSide {
    High,
    Low,
}

impl LabelSide {
    pub fn sign(&self) -> f64 {
        match self {
            LabelSide::High => 1.0,
            LabelSide::Low => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSide::High => "high",
            LabelSide::Low => "low",
        }
    }
}

/// Exponential moving average; `out[0] = values[0]`.
pub fn ema(values: &[f64], period: u32) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let alpha = 2.0 / (f64::from(period) + 1.0);
    let mut prev = match values.first() {
        Some(v) => *v,
        None => return out,
    };
    for v in values {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Trailing-window maximum over up to `period` values ending at each index.
pub fn rolling_max(values: &[f64], period: u32) -> Vec<f64> {
    trailing(values, period, |window| {
        window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Trailing-window minimum over up to `period` values ending at each index.
pub fn rolling_min(values: &[f64], period: u32) -> Vec<f64> {
    trailing(values, period, |window| {
        window.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

/// Trailing-window population standard deviation.
pub fn stdev(values: &[f64], period: u32) -> Vec<f64> {
    trailing(values, period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        (window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
    })
}

fn trailing(values: &[f64], period: u32, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let period = period.max(1) as usize;
    (0..values.len())
        .map(|i| f(&values[i.saturating_sub(period - 1)..=i]))
        .collect()
}

/// Forward excursions over the next `period` bars.
///
/// `out[i] = (max(0, high[j] - close[i]), min(0, low[j] - close[i]))` for
/// `j in i+1..=i+period`: the high excursion is floored at zero and the low
/// excursion capped at it. The final `period + 1` slots have no full
/// look-ahead and stay `(0, 0)`; streams of `period + 1` bars or fewer label
/// nothing.
pub fn preview_high_low(bars: &[Bar], period: u32) -> Vec<(f64, f64)> {
    let period = period as usize;
    let mut out = vec![(0.0, 0.0); bars.len()];
    if bars.len() <= period + 1 {
        return out;
    }
    for i in 0..bars.len() - period - 1 {
        let close = bars[i].close;
        let mut best_high = 0.0f64;
        let mut worst_low = 0.0f64;
        for bar in &bars[i + 1..=i + period] {
            best_high = best_high.max(bar.high - close);
            worst_low = worst_low.min(bar.low - close);
        }
        out[i] = (best_high, worst_low);
    }
    out
}

/// Builds one feature record per bar, memoized per `(source, side, config)`.
///
/// Features are deltas against the current close so the model sees
/// price-level-free inputs; the label is the preview excursion for `side`,
/// oriented so larger is better.
pub fn build_records(
    cache: &MemoCache,
    source: &str,
    bars: &[Bar],
    config: &ForecastConfig,
    side: LabelSide,
) -> Arc<Vec<FeatureRecord>> {
    let key = CacheKey::new(
        "feature.records",
        [
            source.to_string(),
            side.as_str().to_string(),
            config.history_bars.to_string(),
            config.preview_bars.to_string(),
        ],
    );
    cache.get_or_compute(&key, || compute_records(bars, config, side))
}

fn compute_records(bars: &[Bar], config: &ForecastConfig, side: LabelSide) -> Vec<FeatureRecord> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let period = config.history_bars;
    let ema_base = ema(&closes, period);
    let ema_fast = ema(&closes, period / 2);
    let ema_slow = ema(&closes, period * 2);
    let vol = stdev(&closes, period);
    let res_high = rolling_max(&highs, period);
    let res_low = rolling_min(&lows, period);
    let previews = preview_high_low(bars, config.preview_bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let close = bar.close;
            let label = match side {
                LabelSide::High => previews[i].0,
                LabelSide::Low => -previews[i].1,
            };
            FeatureRecord::new(
                bar.timestamp,
                vec![
                    ema_base[i] - close,
                    ema_slow[i] - close,
                    ema_base[i] - ema_fast[i],
                    vol[i],
                    res_high[i] - close,
                    res_low[i] - close,
                ],
                label,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_bars;
    use rollcast_core::Interval;

    #[test]
    fn ema_of_constant_series_is_constant() {
        let out = ema(&[5.0; 10], 4);
        assert!(out.iter().all(|v| (*v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn ema_handles_empty_input() {
        assert!(ema(&[], 4).is_empty());
    }

    #[test]
    fn rolling_extrema_bracket_the_series() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert_eq!(max[4], 5.0); // window [4, 1, 5]
        assert_eq!(min[5], 1.0); // window [1, 5, 9]
        for (i, v) in values.iter().enumerate() {
            assert!(min[i] <= *v && *v <= max[i]);
        }
    }

    #[test]
    fn stdev_of_constant_series_is_zero() {
        let out = stdev(&[2.0; 8], 4);
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn preview_matches_hand_computed_excursions() {
        let mut bars = synthetic_bars(6, Interval::from_minutes(5), 3);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.close = 100.0;
            bar.high = 100.0 + i as f64;
            bar.low = 100.0 - 2.0 * i as f64;
        }
        let out = preview_high_low(&bars, 2);
        // i = 0 looks at bars 1..=2: highs 101/102, lows 98/96.
        assert_eq!(out[0], (2.0, -4.0));
        // Trailing slots have no full preview.
        assert_eq!(out[3], (0.0, 0.0));
        assert_eq!(out[4], (0.0, 0.0));
        assert_eq!(out[5], (0.0, 0.0));
    }

    #[test]
    fn excursions_are_zero_floored() {
        // A steadily falling market: no bar ever trades above the prior close,
        // so the high excursion clamps to 0 instead of going negative.
        let mut bars = synthetic_bars(8, Interval::from_minutes(5), 4);
        for (i, bar) in bars.iter_mut().enumerate() {
            let level = 100.0 - 5.0 * i as f64;
            bar.close = level;
            bar.high = level + 1.0;
            bar.low = level - 1.0;
        }
        let out = preview_high_low(&bars, 2);
        assert!(out.iter().all(|(h, _)| *h >= 0.0));
        assert_eq!(out[0].0, 0.0); // next highs are 96 and 91, both below 100
        assert_eq!(out[0].1, -11.0); // low of bar 2 is 89
    }

    #[test]
    fn short_stream_labels_nothing() {
        let bars = synthetic_bars(3, Interval::from_minutes(5), 3);
        let out = preview_high_low(&bars, 2);
        assert!(out.iter().all(|pair| *pair == (0.0, 0.0)));
    }

    #[test]
    fn records_cover_every_bar_and_are_memoized() {
        let cache = MemoCache::new();
        let bars = synthetic_bars(100, Interval::from_minutes(5), 11);
        let config = ForecastConfig::default();

        let first = build_records(&cache, "synthetic", &bars, &config, LabelSide::High);
        assert_eq!(first.len(), bars.len());
        assert_eq!(first[0].features.len(), 6);

        let second = build_records(&cache, "synthetic", &bars, &config, LabelSide::High);
        assert!(Arc::ptr_eq(&first, &second), "second call must hit cache");

        let low = build_records(&cache, "synthetic", &bars, &config, LabelSide::Low);
        assert!(!Arc::ptr_eq(&first, &low), "sides are distinct entries");
    }

    #[test]
    fn low_side_labels_are_negated_excursions() {
        let cache = MemoCache::new();
        let bars = synthetic_bars(50, Interval::from_minutes(5), 11);
        let config = ForecastConfig::default();
        let low = build_records(&cache, "synthetic", &bars, &config, LabelSide::Low);
        let previews = preview_high_low(&bars, config.preview_bars);
        for (record, preview) in low.iter().zip(&previews) {
            assert_eq!(record.label, -preview.1);
        }
    }
}
