//! Trend-reversal (SAR-type) zone.
//!
//! Buy zone: the level has been below price for `[min_dots, max_dots]`
//! consecutive days, so the up-trend is young. Instruments that keep printing
//! new highs are excluded by the runaway filter.
//!
//! Sell: the level crosses back above price. This is an event, not gated by the
//! streak length.

use crate::config::{ConfigError, IndicatorConfig};
use crate::matrix::{CountMatrix, FloatMatrix, MatrixError};
use crate::streak::streak;

use super::{Condition, Event};

/// Excludes instruments whose price made a new rolling high on too many of the
/// recent days.
#[derive(Debug, Clone, PartialEq)]
pub struct RunawayFilter {
    window: usize,
    max_ratio: f64,
}

impl RunawayFilter {
    pub fn new(window: usize, max_ratio: f64) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "new_high_window",
            });
        }
        if !(0.0..=1.0).contains(&max_ratio) {
            return Err(ConfigError::InvalidRatio {
                field: "new_high_max_ratio",
                value: max_ratio,
            });
        }
        Ok(Self { window, max_ratio })
    }

    /// True where the share of new-high days over the trailing window exceeds
    /// the ratio. Rows without a full window of history are never runaway.
    pub fn evaluate(&self, price: &FloatMatrix) -> Result<Condition, MatrixError> {
        let rolling_high = price.rolling_max(self.window);
        let is_new_high = price.ge(&rolling_high)?;
        let ratio = is_new_high.to_float().rolling_mean(self.window);
        Ok(Condition::new(ratio.gt_scalar(self.max_ratio)))
    }
}

/// Trend zone parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendZone {
    min_dots: u32,
    max_dots: u32,
    runaway: RunawayFilter,
}

/// Everything the trend zone derives, kept for inspection.
#[derive(Debug, Clone)]
pub struct TrendZoneSignals {
    /// Level strictly below price.
    pub below: Condition,
    /// Consecutive days of `below`.
    pub streak: CountMatrix,
    pub runaway: Condition,
    /// Young up-trend and not a runaway.
    pub buy_zone: Condition,
    /// Level crosses back above price.
    pub sell: Event,
}

impl TrendZone {
    pub fn new(min_dots: u32, max_dots: u32, runaway: RunawayFilter) -> Result<Self, ConfigError> {
        if min_dots == 0 || min_dots > max_dots {
            return Err(ConfigError::InvalidDots {
                min: min_dots,
                max: max_dots,
            });
        }
        Ok(Self {
            min_dots,
            max_dots,
            runaway,
        })
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, ConfigError> {
        let runaway = RunawayFilter::new(config.new_high_window, config.new_high_max_ratio)?;
        Self::new(config.sar_min_dots, config.sar_max_dots, runaway)
    }

    pub fn evaluate(
        &self,
        indicator: &FloatMatrix,
        price: &FloatMatrix,
    ) -> Result<TrendZoneSignals, MatrixError> {
        let below = Condition::new(indicator.lt(price)?);
        let streak = streak(below.matrix());

        let (min, max) = (self.min_dots, self.max_dots);
        let in_zone = Condition::new(streak.map(|s| (min..=max).contains(s)));

        let runaway = self.runaway.evaluate(price)?;
        log::info!(
            "trend zone: {} instruments, {} flagged as runaway at least once",
            price.n_cols(),
            runaway.matrix().columns_with_any()
        );

        let buy_zone = in_zone.and(&runaway.negate())?;
        let sell = below.releases();

        Ok(TrendZoneSignals {
            below,
            streak,
            runaway,
            buy_zone,
            sell,
        })
    }
}
