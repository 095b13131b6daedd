//! HoldLab Core — signal composition and position construction.
//!
//! This crate turns market data or external recommendations into a position
//! matrix ready for a backtest simulator:
//! - Date × instrument matrices with explicit alignment
//! - Streak counting and per-indicator conditions (trend zone, crossover,
//!   volume, institutional flow)
//! - Signal composition with a single look-ahead shift
//! - Hold-until state machine and first-K capacity allocation
//! - Recommendation adapter (period alignment, dedup, trading window)
//! - Strategy pipelines producing a `BacktestRequest`

pub mod allocator;
pub mod composer;
pub mod conditions;
pub mod config;
pub mod data;
pub mod hold;
pub mod matrix;
pub mod recommendation;
pub mod request;
pub mod strategy;
pub mod streak;

pub use allocator::{allocate, keep_first_k, Allocation, AllocationRecord, Capacity};
pub use composer::{ComposedSignals, ShiftedSignals, SignalComposer};
pub use conditions::{Condition, Event};
pub use config::{ConfigError, HoldlabConfig};
pub use hold::{hold_until, HoldState};
pub use matrix::{BoolMatrix, CountMatrix, FloatMatrix, MatrixError, TimeSeriesMatrix};
pub use request::{BacktestRequest, PositionMatrix, SimParams};
pub use strategy::{IndicatorStrategy, RecommendationStrategy, StrategyError};
pub use streak::streak;
