//! Rollcast CLI — rolling-forecast commands.
//!
//! Commands:
//! - `forecast` — run one lifecycle configuration over a bar file
//! - `sweep` — grid-search the lifecycle tunables and rank them
//! - `synth` — generate a deterministic synthetic bar file
//! - `cache status` / `cache clean` — inspect or empty the model store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use rollcast_core::{Bar, Estimator, Interval, MemoCache};
use rollcast_runner::{
    build_records, load_bars, run_sweep, synthetic_bars, write_bars, DiskStore, ForecastConfig,
    Forecaster, ForestEstimator, LabelSide, MeanEstimator, ParamGrid,
};

#[derive(Parser)]
#[command(name = "rollcast", about = "Rollcast CLI — rolling-window forecast engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EstimatorKind {
    Forest,
    Mean,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    High,
    Low,
}

impl From<Side> for LabelSide {
    fn from(side: Side) -> Self {
        match side {
            Side::High => LabelSide::High,
            Side::Low => LabelSide::Low,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lifecycle configuration over a CSV bar file.
    Forecast {
        /// Bar file (CSV: timestamp,open,high,low,close,volume).
        input: PathBuf,

        /// TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Training backend.
        #[arg(long, value_enum, default_value_t = EstimatorKind::Forest)]
        estimator: EstimatorKind,

        /// Which excursion to forecast.
        #[arg(long, value_enum, default_value_t = Side::High)]
        side: Side,

        /// Model store directory. Defaults to ./models.
        #[arg(long, default_value = "models")]
        cache_dir: PathBuf,

        /// Output CSV (timestamp,close,forecast). Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Grid-search the lifecycle tunables and print a ranking.
    Sweep {
        /// Bar file (CSV: timestamp,open,high,low,close,volume).
        input: PathBuf,

        /// TOML base config; the grid varies lifecycle fields around it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Training backend.
        #[arg(long, value_enum, default_value_t = EstimatorKind::Forest)]
        estimator: EstimatorKind,

        /// Which excursion to forecast.
        #[arg(long, value_enum, default_value_t = Side::High)]
        side: Side,

        /// Model store directory. Defaults to ./models.
        #[arg(long, default_value = "models")]
        cache_dir: PathBuf,

        /// Print only the top N outcomes.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Generate a deterministic synthetic bar file.
    Synth {
        /// Output CSV path.
        output: PathBuf,

        /// Number of bars.
        #[arg(long, default_value_t = 5760)]
        bars: usize,

        /// Bar resolution in minutes.
        #[arg(long, default_value_t = 5)]
        minutes: u32,

        /// Random-walk seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Model store management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report how many model artifacts the store holds.
    Status {
        /// Model store directory. Defaults to ./models.
        #[arg(long, default_value = "models")]
        cache_dir: PathBuf,
    },
    /// Remove every stored model artifact.
    Clean {
        /// Model store directory. Defaults to ./models.
        #[arg(long, default_value = "models")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only reports what would go).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Forecast {
            input,
            config,
            estimator,
            side,
            cache_dir,
            output,
        } => run_forecast(&input, config.as_deref(), estimator, side.into(), &cache_dir, output),
        Commands::Sweep {
            input,
            config,
            estimator,
            side,
            cache_dir,
            top,
        } => run_sweep_cmd(&input, config.as_deref(), estimator, side.into(), &cache_dir, top),
        Commands::Synth {
            output,
            bars,
            minutes,
            seed,
        } => run_synth(&output, bars, minutes, seed),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean { cache_dir, confirm } => run_cache_clean(&cache_dir, confirm),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<ForecastConfig> {
    match path {
        Some(path) => ForecastConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ForecastConfig::default()),
    }
}

fn make_estimator(kind: EstimatorKind) -> Box<dyn Estimator> {
    match kind {
        EstimatorKind::Forest => Box::new(ForestEstimator::default()),
        EstimatorKind::Mean => Box::new(MeanEstimator),
    }
}

fn source_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bars".to_string())
}

fn run_forecast(
    input: &Path,
    config_path: Option<&Path>,
    estimator_kind: EstimatorKind,
    side: LabelSide,
    cache_dir: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let bars = load_bars(input).with_context(|| format!("loading bars {}", input.display()))?;
    let estimator = make_estimator(estimator_kind);
    let store = DiskStore::new(cache_dir)?;

    let cache = MemoCache::new();
    let source = source_name(input);
    let records = build_records(&cache, &source, &bars, &config, side);

    let prefix = format!(
        "{}.{}.{}.h{}.p{}",
        source,
        estimator.name(),
        side.as_str(),
        config.history_bars,
        config.preview_bars,
    );
    let forecaster = Forecaster::new(estimator.as_ref(), &store, config)?;
    let forecast = forecaster.build(&prefix, &records, |p| p.score)?;

    write_forecast(output.as_deref(), &bars, &forecast)?;
    info!(bars = bars.len(), "forecast complete");
    Ok(())
}

fn write_forecast(output: Option<&Path>, bars: &[Bar], forecast: &[f64]) -> Result<()> {
    use std::io::Write;

    let mut sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    writeln!(sink, "timestamp,close,forecast")?;
    for (bar, value) in bars.iter().zip(forecast) {
        writeln!(
            sink,
            "{},{},{}",
            bar.timestamp.and_utc().timestamp(),
            bar.close,
            value
        )?;
    }
    Ok(())
}

fn run_sweep_cmd(
    input: &Path,
    config_path: Option<&Path>,
    estimator_kind: EstimatorKind,
    side: LabelSide,
    cache_dir: &Path,
    top: usize,
) -> Result<()> {
    let base = load_config(config_path)?;
    let bars = load_bars(input).with_context(|| format!("loading bars {}", input.display()))?;
    let estimator = make_estimator(estimator_kind);
    let store = DiskStore::new(cache_dir)?;

    let grid = ParamGrid::lifecycle_default();
    let source = source_name(input);
    let cache = MemoCache::new();
    let outcomes = run_sweep(
        &grid,
        &base,
        &bars,
        &source,
        side,
        estimator.as_ref(),
        &store,
        &cache,
    )?;

    println!(
        "{:<6} {:<10} {:<12} {:<12} {:<12}",
        "Rank", "Score", "TrainDays", "RetrainMin", "LastModels"
    );
    println!("{}", "-".repeat(54));
    for (rank, outcome) in outcomes.iter().take(top).enumerate() {
        println!(
            "{:<6} {:<10.5} {:<12} {:<12} {:<12}",
            rank + 1,
            outcome.score,
            outcome.config.train_days,
            outcome.config.retrain_minutes,
            outcome.config.last_models,
        );
    }
    Ok(())
}

fn run_synth(output: &Path, bars: usize, minutes: u32, seed: u64) -> Result<()> {
    let series = synthetic_bars(bars, Interval::from_minutes(minutes), seed);
    write_bars(output, &series)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {} bars to {}", series.len(), output.display());
    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Model store does not exist: {}", cache_dir.display());
        return Ok(());
    }
    let store = DiskStore::new(cache_dir)?;
    println!("Model store: {}", cache_dir.display());
    println!("Artifacts: {}", store.len()?);
    Ok(())
}

fn run_cache_clean(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Model store does not exist: {}", cache_dir.display());
        return Ok(());
    }
    let store = DiskStore::new(cache_dir)?;
    let count = store.len()?;
    if count == 0 {
        println!("Model store is already empty.");
        return Ok(());
    }
    if !confirm {
        println!("Would remove {count} artifact(s). Pass --confirm to actually delete.");
        return Ok(());
    }
    store.clear()?;
    println!("Removed {count} artifact(s).");
    Ok(())
}
