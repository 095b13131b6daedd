//! Hand-off to the backtest-execution collaborator.
//!
//! A `BacktestRequest` is the final product of both strategy variants: a
//! position matrix plus the run parameters the simulator needs. PnL, fees and
//! reports are computed on the other side of this boundary.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::{DEFAULT_FEE_RATIO, DEFAULT_TAX_RATIO};
use crate::data::wide_csv::write_matrix;
use crate::data::DataError;
use crate::matrix::{BoolMatrix, FloatMatrix};

/// Price the simulator trades at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradePrice {
    Open,
    Close,
}

/// Rebalance frequency requested from the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    Daily,
    Weekly,
    Monthly,
}

/// Run parameters accompanying a position matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// `None` rebalances whenever the position matrix changes.
    pub resample: Option<Resample>,
    pub fee_ratio: f64,
    pub tax_ratio: f64,
    /// Maximum weight of a single instrument (1/K for a K-slot portfolio).
    pub position_limit: f64,
    /// `None` uses the simulator's default (close).
    pub trade_price: Option<TradePrice>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            resample: None,
            fee_ratio: DEFAULT_FEE_RATIO,
            tax_ratio: DEFAULT_TAX_RATIO,
            position_limit: 1.0,
            trade_price: None,
        }
    }
}

/// Final allocation: either hold/flat flags or explicit weights.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionMatrix {
    Signals(BoolMatrix),
    Weights(FloatMatrix),
}

impl PositionMatrix {
    pub fn n_rows(&self) -> usize {
        match self {
            PositionMatrix::Signals(m) => m.n_rows(),
            PositionMatrix::Weights(m) => m.n_rows(),
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            PositionMatrix::Signals(m) => m.columns(),
            PositionMatrix::Weights(m) => m.columns(),
        }
    }

    /// Instrument-days with a non-zero position.
    pub fn holding_cells(&self) -> usize {
        match self {
            PositionMatrix::Signals(m) => m.count_true(),
            PositionMatrix::Weights(m) => m
                .iter_columns()
                .map(|(_, col)| col.iter().filter(|w| **w != 0.0).count())
                .sum(),
        }
    }
}

/// Everything the backtest collaborator needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub position: PositionMatrix,
    pub params: SimParams,
}

impl BacktestRequest {
    /// Write the position matrix as a wide CSV (`1`/`0` flags or weights).
    pub fn write_position_csv(&self, path: &Path) -> Result<(), DataError> {
        let file = File::create(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let writer = BufWriter::new(file);
        match &self.position {
            PositionMatrix::Signals(m) => {
                write_matrix(writer, m, |v| if *v { "1".into() } else { "0".into() })
            }
            PositionMatrix::Weights(m) => write_matrix(writer, m, |w| format!("{w:.6}")),
        }
    }

    /// Write the run parameters as pretty JSON.
    pub fn write_params_json(&self, path: &Path) -> Result<(), DataError> {
        let json = serde_json::to_string_pretty(&self.params)
            .map_err(|e| DataError::Validation(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::test_support::*;

    #[test]
    fn params_serialize_snake_case() {
        let params = SimParams {
            resample: Some(Resample::Daily),
            trade_price: Some(TradePrice::Open),
            position_limit: 0.25,
            ..SimParams::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["resample"], "daily");
        assert_eq!(json["trade_price"], "open");
        assert_eq!(json["position_limit"], 0.25);
        assert_eq!(json["fee_ratio"], 0.001425);
    }

    #[test]
    fn holding_cells_counts_non_zero() {
        let signals = PositionMatrix::Signals(matrix(&[vec![true, false], vec![true, true]]));
        assert_eq!(signals.holding_cells(), 3);
        let weights = PositionMatrix::Weights(matrix(&[vec![0.5, 0.0], vec![0.0, 0.0]]));
        assert_eq!(weights.holding_cells(), 1);
    }

    #[test]
    fn writes_position_and_params() {
        let dir = tempfile::tempdir().unwrap();
        let request = BacktestRequest {
            position: PositionMatrix::Weights(matrix(&[vec![0.5, 0.0]])),
            params: SimParams::default(),
        };
        let csv_path = dir.path().join("positions.csv");
        let json_path = dir.path().join("params.json");
        request.write_position_csv(&csv_path).unwrap();
        request.write_params_json(&json_path).unwrap();

        let csv = std::fs::read_to_string(csv_path).unwrap();
        assert_eq!(csv, "date,S1\n2024-01-01,0.500000\n2024-01-02,0.000000\n");
        let params: SimParams =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(params, SimParams::default());
    }
}
