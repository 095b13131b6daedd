//! Parameter sweeps over the indicator strategy.
//!
//! - [`CapacitySweep`]: one run per capacity in `[min_stocks, max_stocks]`.
//! - [`InstrumentSweep`]: one run per signalled instrument, holding only it.
//!
//! The strategy's signals are composed once; every task only slices and caps
//! the shared base position before calling the executor.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use holdlab_core::config::ConfigError;
use holdlab_core::IndicatorStrategy;

use crate::executor::{BacktestExecutor, ExecutionError, RunMetrics};
use crate::pool::WorkerPool;

// ─── Capacity sweep ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CapacitySweep {
    min_stocks: usize,
    max_stocks: usize,
    start: NaiveDate,
    workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityRow {
    pub max_stocks: usize,
    /// Per-instrument cap, in percent (100 / K).
    pub position_limit_pct: f64,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
    /// Sorted by `max_stocks`.
    pub rows: Vec<CapacityRow>,
    pub failures: Vec<(usize, String)>,
}

impl CapacitySweep {
    pub fn new(
        min_stocks: usize,
        max_stocks: usize,
        start: NaiveDate,
        workers: usize,
    ) -> Result<Self, ConfigError> {
        if min_stocks == 0 {
            return Err(ConfigError::InvalidCapacity(0));
        }
        if min_stocks > max_stocks {
            return Err(ConfigError::EmptySweepRange {
                min: min_stocks,
                max: max_stocks,
            });
        }
        Ok(Self {
            min_stocks,
            max_stocks,
            start,
            workers,
        })
    }

    pub fn capacities(&self) -> Vec<usize> {
        (self.min_stocks..=self.max_stocks).collect()
    }

    pub fn run(
        &self,
        strategy: &IndicatorStrategy,
        executor: &dyn BacktestExecutor,
    ) -> Result<CapacityReport> {
        let pool = WorkerPool::new(self.workers).context("failed to build sweep thread pool")?;
        let capacities = self.capacities();
        log::info!(
            "capacity sweep {}..={} from {} on {} workers",
            self.min_stocks,
            self.max_stocks,
            self.start,
            pool.workers()
        );

        let outcome = pool.run(&capacities, |&k| -> Result<CapacityRow, ExecutionError> {
            let request = strategy.allocate(k, self.start)?;
            let metrics = executor.execute(&request)?;
            log::info!("max_stocks={k}: annual return {:.4}", metrics.annual_return);
            Ok(CapacityRow {
                max_stocks: k,
                position_limit_pct: 100.0 / k as f64,
                metrics,
            })
        });

        let mut rows: Vec<CapacityRow> = outcome.results.into_values().collect();
        rows.sort_by_key(|r| r.max_stocks);
        let mut failures = outcome.failures;
        failures.sort_by_key(|(k, _)| *k);
        Ok(CapacityReport { rows, failures })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacitySummary {
    /// `(max_stocks, annual_return)` of the best run.
    pub best_return: Option<(usize, f64)>,
    /// `(max_stocks, sharpe_ratio)` among runs reporting a Sharpe ratio.
    pub best_sharpe: Option<(usize, f64)>,
}

impl CapacityReport {
    pub fn summary(&self) -> CapacitySummary {
        let best_return = self
            .rows
            .iter()
            .map(|r| (r.max_stocks, r.metrics.annual_return))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let best_sharpe = self
            .rows
            .iter()
            .filter_map(|r| r.metrics.sharpe_ratio.map(|s| (r.max_stocks, s)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((k, ret)) = best_return {
            log::info!("best annual return: max_stocks={k} ({:.2}%)", ret * 100.0);
        }
        if let Some((k, sharpe)) = best_sharpe {
            log::info!("best sharpe: max_stocks={k} ({sharpe:.4})");
        }
        CapacitySummary {
            best_return,
            best_sharpe,
        }
    }
}

// ─── Instrument sweep ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSweep {
    start: NaiveDate,
    workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentRow {
    pub instrument: String,
    /// Rows in the test window.
    pub total_days: usize,
    /// Rows on which the instrument is held.
    pub holding_days: usize,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReport {
    /// Sorted by annual return, best first.
    pub rows: Vec<InstrumentRow>,
    pub failures: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub tested: usize,
    pub mean_annual_return: f64,
    pub mean_max_drawdown: f64,
    /// Mean over runs that report the ratio; `None` when none do.
    pub mean_sharpe: Option<f64>,
    pub mean_win_rate: Option<f64>,
    pub positive_count: usize,
    pub top: Vec<InstrumentRow>,
}

impl InstrumentSweep {
    pub fn new(start: NaiveDate, workers: usize) -> Self {
        Self { start, workers }
    }

    pub fn run(
        &self,
        strategy: &IndicatorStrategy,
        executor: &dyn BacktestExecutor,
    ) -> Result<InstrumentReport> {
        let instruments = strategy.signalled_instruments(self.start);
        if instruments.is_empty() {
            log::warn!("no instrument is ever held from {}", self.start);
            return Ok(InstrumentReport {
                rows: Vec::new(),
                failures: Vec::new(),
            });
        }

        let pool = WorkerPool::new(self.workers).context("failed to build sweep thread pool")?;
        log::info!(
            "instrument sweep over {} instruments from {} on {} workers",
            instruments.len(),
            self.start,
            pool.workers()
        );

        let outcome = pool.run(&instruments, |id| -> Result<InstrumentRow, ExecutionError> {
            let request = strategy.single_instrument(id, self.start)?;
            let total_days = request.position.n_rows();
            let holding_days = request.position.holding_cells();
            let metrics = executor.execute(&request)?;
            Ok(InstrumentRow {
                instrument: id.clone(),
                total_days,
                holding_days,
                metrics,
            })
        });

        let mut rows: Vec<InstrumentRow> = outcome.results.into_values().collect();
        rows.sort_by(|a, b| {
            b.metrics
                .annual_return
                .total_cmp(&a.metrics.annual_return)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        let mut failures = outcome.failures;
        failures.sort();
        Ok(InstrumentReport { rows, failures })
    }
}

impl InstrumentReport {
    pub fn summary(&self, top_n: usize) -> Option<InstrumentSummary> {
        if self.rows.is_empty() {
            return None;
        }
        let n = self.rows.len() as f64;
        let mean = |f: fn(&RunMetrics) -> f64| self.rows.iter().map(|r| f(&r.metrics)).sum::<f64>() / n;
        let mean_opt = |f: fn(&RunMetrics) -> Option<f64>| {
            let values: Vec<f64> = self.rows.iter().filter_map(|r| f(&r.metrics)).collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        let summary = InstrumentSummary {
            tested: self.rows.len(),
            mean_annual_return: mean(|m| m.annual_return),
            mean_max_drawdown: mean(|m| m.max_drawdown),
            mean_sharpe: mean_opt(|m| m.sharpe_ratio),
            mean_win_rate: mean_opt(|m| m.win_rate),
            positive_count: self
                .rows
                .iter()
                .filter(|r| r.metrics.annual_return > 0.0)
                .count(),
            top: self.rows.iter().take(top_n).cloned().collect(),
        };

        log::info!(
            "{} instruments tested, {} with positive annual return, mean {:.2}%",
            summary.tested,
            summary.positive_count,
            summary.mean_annual_return * 100.0
        );
        for (rank, row) in summary.top.iter().enumerate() {
            log::info!(
                "#{:<2} {}: annual return {:.2}%, max drawdown {:.2}%, held {}/{} days",
                rank + 1,
                row.instrument,
                row.metrics.annual_return * 100.0,
                row.metrics.max_drawdown * 100.0,
                row.holding_days,
                row.total_days
            );
        }
        Some(summary)
    }
}
