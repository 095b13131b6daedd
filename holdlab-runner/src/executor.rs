//! Backtest-execution boundary.
//!
//! PnL simulation lives outside this workspace. A [`BacktestExecutor`] takes a
//! [`BacktestRequest`] and returns the run's [`RunMetrics`]; sweeps only ever
//! talk to the trait, so tests plug in a deterministic fake.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;

use holdlab_core::data::DataError;
use holdlab_core::{BacktestRequest, StrategyError};

/// Metrics reported by the simulator for one run.
///
/// Ratios are fractions (0.12 = 12 %). Optional fields are absent when the
/// simulator could not compute them (e.g. no trades).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetrics {
    pub total_trades: usize,
    pub annual_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub calmar_ratio: Option<f64>,
    pub volatility: Option<f64>,
    pub profit_factor: Option<f64>,
    pub win_rate: Option<f64>,
    pub expectancy: Option<f64>,
    pub mae: Option<f64>,
    pub mfe: Option<f64>,
    pub avg_drawdown: Option<f64>,
    pub avg_drawdown_days: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("write request: {0}")]
    Request(#[from] DataError),

    #[error("prepare {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("simulator exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("decode simulator metrics: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Runs one backtest. Implementations are shared across sweep workers.
pub trait BacktestExecutor: Send + Sync {
    fn execute(&self, request: &BacktestRequest) -> Result<RunMetrics, ExecutionError>;
}

/// Hands each request to an external simulator process.
///
/// Every run gets a fresh `run-*` directory under `work_dir` holding
/// `positions.csv` and `params.json`. The program is invoked as
/// `<program> [args...] <positions.csv> <params.json>` and must print a
/// `RunMetrics` JSON object on stdout. The directory is removed once the run
/// finishes, successful or not, unless `keep_runs` is set.
#[derive(Debug)]
pub struct CommandExecutor {
    program: PathBuf,
    args: Vec<String>,
    work_dir: PathBuf,
    keep_runs: bool,
}

impl CommandExecutor {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.into(),
            keep_runs: false,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Leave each run's input files on disk for inspection.
    pub fn with_keep_runs(mut self, keep_runs: bool) -> Self {
        self.keep_runs = keep_runs;
        self
    }

    fn run_dir(&self) -> Result<TempDir, ExecutionError> {
        std::fs::create_dir_all(&self.work_dir).map_err(|e| io_error(&self.work_dir, e))?;
        tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(&self.work_dir)
            .map_err(|e| io_error(&self.work_dir, e))
    }

    fn run_in(&self, dir: &Path, request: &BacktestRequest) -> Result<RunMetrics, ExecutionError> {
        let positions = dir.join("positions.csv");
        let params = dir.join("params.json");
        request.write_position_csv(&positions)?;
        request.write_params_json(&params)?;

        log::debug!("running {} in {}", self.program.display(), dir.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&positions)
            .arg(&params)
            .output()
            .map_err(|e| ExecutionError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ExecutionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl BacktestExecutor for CommandExecutor {
    fn execute(&self, request: &BacktestRequest) -> Result<RunMetrics, ExecutionError> {
        let dir = self.run_dir()?;
        let result = self.run_in(dir.path(), request);
        if self.keep_runs {
            let kept = dir.keep();
            log::info!("run inputs kept in {}", kept.display());
        }
        result
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ExecutionError {
    ExecutionError::Io {
        path: path.display().to_string(),
        source,
    }
}
