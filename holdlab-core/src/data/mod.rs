//! Market data boundary.
//!
//! The indicator series themselves (SAR level, MACD lines, institutional net
//! buys) are produced by an upstream data provider. This module only defines
//! the shape the composition engine consumes and a CSV-backed provider.

pub mod market;
pub mod wide_csv;

pub use market::{CsvMarketData, MarketData, MarketDataProvider, SeriesName};

use thiserror::Error;

/// Structured error types for data loading.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("missing series '{0}'")]
    MissingSeries(String),
}
