use super::StrategyError;
use crate::allocator::Capacity;
use crate::config::{HoldlabConfig, TaskConfig};
use crate::matrix::{BoolMatrix, FloatMatrix, MatrixError};
use crate::recommendation::{
    parse_records, PeriodAlignment, RawRecommendation, RecommendationAdapter,
    RecommendationStore, TradingWindow,
};
use crate::request::{BacktestRequest, PositionMatrix, SimParams};

/// Weekly or monthly externally ranked recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationStrategy {
    frequency: PeriodAlignment,
    adapter: RecommendationAdapter,
    window: TradingWindow,
    fee_ratio: f64,
    tax_ratio: f64,
}

impl RecommendationStrategy {
    pub fn new(task: &TaskConfig, frequency: PeriodAlignment) -> Result<Self, StrategyError> {
        task.validate()?;
        let capacity = task.max_stocks.map(Capacity::new).transpose()?;
        let window = TradingWindow::new(task.buy_weekday, task.sell_weekday)?;
        log::info!(
            "[{frequency}] buy weekday {}, sell weekday {}, max stocks {:?}",
            task.buy_weekday,
            task.sell_weekday,
            task.max_stocks
        );
        Ok(Self {
            frequency,
            adapter: RecommendationAdapter::new(frequency, capacity),
            window,
            fee_ratio: task.fee_ratio,
            tax_ratio: task.tax_ratio,
        })
    }

    /// Task settings for `frequency` taken from the full configuration.
    pub fn from_config(
        config: &HoldlabConfig,
        frequency: PeriodAlignment,
    ) -> Result<Self, StrategyError> {
        let task = match frequency {
            PeriodAlignment::Weekly => &config.recommendation.weekly,
            PeriodAlignment::Monthly => &config.recommendation.monthly,
        };
        Self::new(task, frequency)
    }

    pub fn frequency(&self) -> PeriodAlignment {
        self.frequency
    }

    /// Daily position from stored records, on the calendar and columns of
    /// `universe`. `None` when no record survives.
    ///
    /// The result is shifted back one day: a position scheduled for a weekday
    /// is decided the day before.
    pub fn position(
        &self,
        raw: &[RawRecommendation],
        universe: &FloatMatrix,
    ) -> Result<Option<BoolMatrix>, MatrixError> {
        let records = parse_records(raw);
        let Some(position) = self
            .adapter
            .build(&records, universe.index(), universe.columns())?
        else {
            return Ok(None);
        };
        let masked = self.window.apply(&position);
        Ok(Some(masked.shift(-1, false)))
    }

    pub fn build(
        &self,
        store: &dyn RecommendationStore,
        universe: &FloatMatrix,
    ) -> Result<Option<BacktestRequest>, StrategyError> {
        let raw = store.load(self.frequency)?;
        let Some(position) = self.position(&raw, universe)? else {
            return Ok(None);
        };
        Ok(Some(BacktestRequest {
            position: PositionMatrix::Signals(position),
            params: SimParams {
                resample: None,
                fee_ratio: self.fee_ratio,
                tax_ratio: self.tax_ratio,
                position_limit: 1.0,
                trade_price: None,
            },
        }))
    }
}
