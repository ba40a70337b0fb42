//! Bar sources: CSV files and a seeded synthetic random walk.

use std::path::Path;

use chrono::DateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use rollcast_core::{Bar, Interval};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read bar file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed bar row: {0}")]
    Csv(#[from] csv::Error),
    #[error("bar file contains no rows")]
    Empty,
    #[error("bar timestamps must be strictly increasing (row {row})")]
    OutOfOrder { row: usize },
    #[error("row {row} carries an unrepresentable timestamp {timestamp}")]
    BadTimestamp { row: usize, timestamp: i64 },
}

/// CSV row shape: epoch seconds plus OHLCV.
#[derive(Debug, Serialize, Deserialize)]
struct BarRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Loads bars from a headered CSV file, enforcing strictly increasing
/// timestamps. Sanity of individual bars is not enforced here; callers that
/// care use `Bar::is_sane`.
pub fn load_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut bars: Vec<Bar> = Vec::new();
    for (row, result) in reader.deserialize::<BarRow>().enumerate() {
        let raw = result?;
        let timestamp = DateTime::from_timestamp(raw.timestamp, 0)
            .ok_or(LoadError::BadTimestamp {
                row,
                timestamp: raw.timestamp,
            })?
            .naive_utc();
        if let Some(last) = bars.last() {
            if timestamp <= last.timestamp {
                return Err(LoadError::OutOfOrder { row });
            }
        }
        bars.push(Bar {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        });
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    info!(path = %path.as_ref().display(), bars = bars.len(), "loaded bar series");
    Ok(bars)
}

/// Writes bars in the same CSV shape `load_bars` reads.
pub fn write_bars(path: impl AsRef<Path>, bars: &[Bar]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for bar in bars {
        writer.serialize(BarRow {
            timestamp: bar.timestamp.and_utc().timestamp(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Deterministic random-walk bars on a regular grid, for demos and tests.
pub fn synthetic_bars(count: usize, interval: Interval, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = DateTime::from_timestamp(1_704_067_200, 0) // 2024-01-01T00:00:00Z
        .expect("constant epoch is valid")
        .naive_utc();
    let mut close = 100.0;
    let mut bars = Vec::with_capacity(count);
    for i in 0..count {
        let open = close;
        let drift: f64 = rng.gen_range(-0.5..0.5);
        close = (open + drift).max(1.0);
        let high = open.max(close) + rng.gen_range(0.0..0.25);
        let low = (open.min(close) - rng.gen_range(0.0..0.25)).max(0.5);
        bars.push(Bar {
            timestamp: start + interval.shift() * i as i32,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(10.0..1000.0),
        });
    }
    bars
}
