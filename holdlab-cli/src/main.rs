//! HoldLab CLI — build position matrices and run parameter sweeps.
//!
//! Commands:
//! - `compose`: indicator strategy: compose signals, hold, allocate first-K
//! - `recommend`: recommendation strategy: weekly or monthly batches
//! - `sweep-capacity`: run the indicator strategy for every max-stocks value
//! - `sweep-instruments`: run every signalled instrument on its own

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use holdlab_core::data::{CsvMarketData, MarketData, MarketDataProvider};
use holdlab_core::recommendation::{JsonRecommendationStore, PeriodAlignment};
use holdlab_core::{BacktestRequest, HoldlabConfig, IndicatorStrategy, RecommendationStrategy};
use holdlab_runner::{
    export_capacity, export_instruments, CapacitySweep, CommandExecutor, InstrumentSweep,
};

#[derive(Parser)]
#[command(
    name = "holdlab",
    about = "HoldLab CLI — signal composition and capacity-constrained positions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose indicator signals into a capacity-capped position matrix.
    Compose {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of wide CSV series (adj_close.csv, sar.csv, ...).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Override `allocation.max_stocks`.
        #[arg(long)]
        max_stocks: Option<usize>,

        /// Override `allocation.start_date` (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Directory for positions.csv and params.json.
        #[arg(long, default_value = "output/compose")]
        output_dir: PathBuf,
    },

    /// Turn stored recommendation batches into a daily position matrix.
    Recommend {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of wide CSV series; adj_close.csv supplies the calendar
        /// and the instrument universe.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Directory holding weekly.json / monthly.json.
        #[arg(long, default_value = "recommendations")]
        store_dir: PathBuf,

        /// Recommendation cadence: weekly or monthly.
        #[arg(long, default_value = "weekly")]
        frequency: String,

        #[arg(long, default_value = "output/recommend")]
        output_dir: PathBuf,
    },

    /// Sweep max-stocks over an inclusive range.
    SweepCapacity {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, default_value_t = 1)]
        min: usize,

        #[arg(long, default_value_t = 10)]
        max: usize,

        /// Override `allocation.start_date` (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Backtest simulator executable. Called as
        /// `<simulator> [args...] <positions.csv> <params.json>`.
        #[arg(long)]
        simulator: PathBuf,

        /// Extra arguments passed to the simulator before the file paths.
        #[arg(long = "simulator-arg", allow_hyphen_values = true)]
        simulator_args: Vec<String>,

        /// Worker threads.
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Keep each run's positions.csv / params.json under <output-dir>/runs.
        #[arg(long)]
        keep_runs: bool,

        #[arg(long, default_value = "output/sweeps")]
        output_dir: PathBuf,
    },

    /// Backtest every signalled instrument in isolation.
    SweepInstruments {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        simulator: PathBuf,

        #[arg(long = "simulator-arg", allow_hyphen_values = true)]
        simulator_args: Vec<String>,

        #[arg(long, default_value_t = 4)]
        workers: usize,

        #[arg(long)]
        keep_runs: bool,

        /// Number of best instruments listed in the summary.
        #[arg(long, default_value_t = 10)]
        top: usize,

        #[arg(long, default_value = "output/sweeps")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            config,
            data_dir,
            max_stocks,
            start,
            output_dir,
        } => run_compose(config, &data_dir, max_stocks, start, &output_dir),
        Commands::Recommend {
            config,
            data_dir,
            store_dir,
            frequency,
            output_dir,
        } => run_recommend(config, &data_dir, store_dir, &frequency, &output_dir),
        Commands::SweepCapacity {
            config,
            data_dir,
            min,
            max,
            start,
            simulator,
            simulator_args,
            workers,
            keep_runs,
            output_dir,
        } => {
            let executor = CommandExecutor::new(simulator, output_dir.join("runs"))
                .with_args(simulator_args)
                .with_keep_runs(keep_runs);
            run_sweep_capacity(
                config,
                &data_dir,
                (min, max),
                start,
                &executor,
                workers,
                &output_dir,
            )
        }
        Commands::SweepInstruments {
            config,
            data_dir,
            start,
            simulator,
            simulator_args,
            workers,
            keep_runs,
            top,
            output_dir,
        } => {
            let executor = CommandExecutor::new(simulator, output_dir.join("runs"))
                .with_args(simulator_args)
                .with_keep_runs(keep_runs);
            run_sweep_instruments(config, &data_dir, start, &executor, workers, top, &output_dir)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<HoldlabConfig> {
    match path {
        Some(path) => HoldlabConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(HoldlabConfig::default()),
    }
}

fn load_market(data_dir: &Path) -> Result<MarketData> {
    CsvMarketData::new(data_dir)
        .load()
        .with_context(|| format!("failed to load market data from {}", data_dir.display()))
}

fn parse_start(start: Option<String>, fallback: NaiveDate) -> Result<NaiveDate> {
    start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--start must be YYYY-MM-DD")
        .map(|d| d.unwrap_or(fallback))
}

fn write_request(request: &BacktestRequest, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let positions = output_dir.join("positions.csv");
    let params = output_dir.join("params.json");
    request.write_position_csv(&positions)?;
    request.write_params_json(&params)?;
    println!("Positions written to: {}", positions.display());
    println!("Parameters written to: {}", params.display());
    Ok(())
}

fn run_compose(
    config_path: Option<PathBuf>,
    data_dir: &Path,
    max_stocks: Option<usize>,
    start: Option<String>,
    output_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let data = load_market(data_dir)?;
    let start = parse_start(start, config.allocation.start_date)?;
    let max_stocks = max_stocks.unwrap_or(config.allocation.max_stocks);

    let strategy = IndicatorStrategy::new(&config, &data)?;
    let request = strategy.allocate(max_stocks, start)?;

    println!("Config fingerprint: {}", strategy.fingerprint());
    let conditions = strategy.conditions();
    println!(
        "Instrument-days: {} in buy zone, {} liquid, {} weak institutional flow, {} golden crosses",
        conditions.trend.buy_zone.matrix().count_true(),
        conditions.volume.matrix().count_true(),
        conditions.flow.weak.matrix().count_true(),
        conditions.cross.golden.matrix().count_true()
    );
    let signals = strategy.signals();
    println!(
        "Signals (shifted one period): {} buy, {} sell",
        signals.buy().matrix().count_true(),
        signals.sell().matrix().count_true()
    );
    println!(
        "{} dates x {} instruments, {} instrument-days held (max {max_stocks} slots)",
        request.position.n_rows(),
        request.position.columns().len(),
        request.position.holding_cells()
    );
    write_request(&request, output_dir)
}

fn run_recommend(
    config_path: Option<PathBuf>,
    data_dir: &Path,
    store_dir: PathBuf,
    frequency: &str,
    output_dir: &Path,
) -> Result<()> {
    let frequency: PeriodAlignment = match frequency.parse() {
        Ok(f) => f,
        Err(e) => bail!("{e}"),
    };
    let config = load_config(config_path)?;
    let data = load_market(data_dir)?;

    let strategy = RecommendationStrategy::from_config(&config, frequency)?;
    let store = JsonRecommendationStore::new(store_dir);
    let Some(request) = strategy.build(&store, &data.adj_close)? else {
        println!(
            "No usable {} recommendations; nothing written.",
            strategy.frequency()
        );
        return Ok(());
    };

    println!(
        "{}: {} dates, {} instrument-days held",
        strategy.frequency(),
        request.position.n_rows(),
        request.position.holding_cells()
    );
    write_request(&request, output_dir)
}

fn run_sweep_capacity(
    config_path: Option<PathBuf>,
    data_dir: &Path,
    (min, max): (usize, usize),
    start: Option<String>,
    executor: &CommandExecutor,
    workers: usize,
    output_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let data = load_market(data_dir)?;
    let start = parse_start(start, config.allocation.start_date)?;

    let strategy = IndicatorStrategy::new(&config, &data)?;
    let sweep = CapacitySweep::new(min, max, start, workers)?;
    let report = sweep.run(&strategy, executor)?;

    for (k, err) in &report.failures {
        eprintln!("max_stocks={k} failed: {err}");
    }
    if report.rows.is_empty() {
        bail!("every capacity run failed");
    }

    let summary = report.summary();
    if let Some((k, ret)) = summary.best_return {
        println!("Best annual return: {:.2}% at max_stocks={k}", ret * 100.0);
    }
    if let Some((k, sharpe)) = summary.best_sharpe {
        println!("Best Sharpe ratio: {sharpe:.3} at max_stocks={k}");
    }

    let path = export_capacity(output_dir, &report.rows)?;
    println!("Results saved to: {}", path.display());
    Ok(())
}

fn run_sweep_instruments(
    config_path: Option<PathBuf>,
    data_dir: &Path,
    start: Option<String>,
    executor: &CommandExecutor,
    workers: usize,
    top: usize,
    output_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let data = load_market(data_dir)?;
    let start = parse_start(start, config.allocation.start_date)?;

    let strategy = IndicatorStrategy::new(&config, &data)?;
    let report = InstrumentSweep::new(start, workers).run(&strategy, executor)?;

    for (id, err) in &report.failures {
        eprintln!("{id} failed: {err}");
    }
    let Some(summary) = report.summary(top) else {
        println!("No instrument produced a result.");
        return Ok(());
    };

    println!(
        "Tested {} instruments, {} with positive annual return",
        summary.tested, summary.positive_count
    );
    println!(
        "Mean annual return {:.2}%, mean max drawdown {:.2}%",
        summary.mean_annual_return * 100.0,
        summary.mean_max_drawdown * 100.0
    );
    for (rank, row) in summary.top.iter().enumerate() {
        println!(
            "{:>3}. {:<10} {:>8.2}%  held {}/{} days",
            rank + 1,
            row.instrument,
            row.metrics.annual_return * 100.0,
            row.holding_days,
            row.total_days
        );
    }

    let path = export_instruments(output_dir, &report.rows)?;
    println!("Results saved to: {}", path.display());
    Ok(())
}
