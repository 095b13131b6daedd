use chrono::NaiveDate;

use super::StrategyError;
use crate::allocator::{allocate, isolate_column, Allocation, Capacity};
use crate::composer::{IndicatorConditions, ShiftedSignals, SignalComposer};
use crate::config::{AllocationConfig, HoldlabConfig};
use crate::data::MarketData;
use crate::matrix::BoolMatrix;
use crate::request::{BacktestRequest, PositionMatrix, Resample, SimParams};

/// Trend-zone / crossover / liquidity / institutional-flow strategy.
///
/// Signals and the uncapped holding state are computed once at construction;
/// `allocate` and `single_instrument` only slice and cap them, so a sweep over
/// many capacities or instruments reuses one composition.
#[derive(Debug, Clone)]
pub struct IndicatorStrategy {
    allocation: AllocationConfig,
    fingerprint: String,
    conditions: IndicatorConditions,
    signals: ShiftedSignals,
    base_position: BoolMatrix,
}

impl IndicatorStrategy {
    pub fn new(config: &HoldlabConfig, data: &MarketData) -> Result<Self, StrategyError> {
        config.validate()?;
        let composer = SignalComposer::from_config(&config.indicator)?;
        let conditions = composer.conditions(data)?;
        let signals = SignalComposer::combine(&conditions)?.shifted();
        let base_position = signals.hold()?;

        let fingerprint = config.fingerprint()?;
        log::info!(
            "indicator strategy {}: {} instrument-days held before capacity",
            &fingerprint[..12],
            base_position.count_true()
        );

        Ok(Self {
            allocation: config.allocation.clone(),
            fingerprint,
            conditions,
            signals,
            base_position,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn conditions(&self) -> &IndicatorConditions {
        &self.conditions
    }

    pub fn signals(&self) -> &ShiftedSignals {
        &self.signals
    }

    /// Holding state before any capacity cap, over the full history.
    pub fn base_position(&self) -> &BoolMatrix {
        &self.base_position
    }

    pub fn universe(&self) -> &[String] {
        self.base_position.columns()
    }

    /// First-K selection on every date from `start` on.
    pub fn allocation(&self, capacity: Capacity, start: NaiveDate) -> Allocation {
        allocate(&self.base_position.slice_from(start), capacity)
    }

    /// Capacity-capped portfolio run: weights of 1/K per selected slot.
    pub fn allocate(
        &self,
        max_stocks: usize,
        start: NaiveDate,
    ) -> Result<BacktestRequest, StrategyError> {
        let capacity = Capacity::new(max_stocks)?;
        let allocation = self.allocation(capacity, start);
        Ok(BacktestRequest {
            position: PositionMatrix::Weights(allocation.weights()),
            params: self.params(capacity.slot_weight()),
        })
    }

    /// Run holding only `id`, with the whole book available to it.
    pub fn single_instrument(
        &self,
        id: &str,
        start: NaiveDate,
    ) -> Result<BacktestRequest, StrategyError> {
        let window = self.base_position.slice_from(start);
        let isolated = isolate_column(&window, id)
            .ok_or_else(|| StrategyError::UnknownInstrument(id.to_string()))?;
        Ok(BacktestRequest {
            position: PositionMatrix::Signals(isolated),
            params: self.params(1.0),
        })
    }

    /// Instruments held at least once from `start` on, in column order.
    pub fn signalled_instruments(&self, start: NaiveDate) -> Vec<String> {
        let window = self.base_position.slice_from(start);
        window
            .iter_columns()
            .filter(|(_, col)| col.iter().any(|v| *v))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn params(&self, position_limit: f64) -> SimParams {
        SimParams {
            resample: Some(Resample::Daily),
            fee_ratio: self.allocation.fee_ratio,
            tax_ratio: self.allocation.tax_ratio,
            position_limit,
            trade_price: Some(self.allocation.trade_price),
        }
    }
}
