//! HoldLab Runner — parallel parameter sweeps and result export.
//!
//! This crate builds on `holdlab-core` to provide:
//! - The backtest-executor boundary (trait + external-process executor)
//! - A fixed-size worker pool with per-task failure isolation
//! - Capacity (max-stocks) and single-instrument sweeps with summaries
//! - CSV export of sweep results

pub mod executor;
pub mod export;
pub mod pool;
pub mod sweep;

pub use executor::{BacktestExecutor, CommandExecutor, ExecutionError, RunMetrics};
pub use export::{export_capacity, export_instruments};
pub use pool::{SweepOutcome, WorkerPool};
pub use sweep::{
    CapacityReport, CapacityRow, CapacitySummary, CapacitySweep, InstrumentReport, InstrumentRow,
    InstrumentSummary, InstrumentSweep,
};
