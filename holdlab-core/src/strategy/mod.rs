//! End-to-end pipelines producing a [`BacktestRequest`](crate::request::BacktestRequest).
//!
//! - [`IndicatorStrategy`]: market data → conditions → composed signals →
//!   one-period shift → hold-until → first-K capacity allocation.
//! - [`RecommendationStrategy`]: stored recommendations → period batches →
//!   daily position → trading window → one-day backward shift.

pub mod indicator;
pub mod recommendation;

pub use indicator::IndicatorStrategy;
pub use recommendation::RecommendationStrategy;

use thiserror::Error;

use crate::config::ConfigError;
use crate::matrix::MatrixError;
use crate::recommendation::StoreError;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("instrument '{0}' is not in the universe")]
    UnknownInstrument(String),
}
