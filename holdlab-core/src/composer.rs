//! Signal composer: per-indicator conditions in, unified buy/sell events out.
//!
//! ```text
//! buy  = golden_cross gated by (trend buy zone AND volume filter AND weak flow)
//! sell = trend sell event OR death cross
//! ```
//!
//! The look-ahead correction lives on [`ComposedSignals::shifted`], which
//! consumes the unshifted signals so the one-period shift happens exactly once.

use crate::conditions::{
    crossover, Condition, CrossoverSignals, Event, FlowSignals, InstitutionalFlow, TrendZone,
    TrendZoneSignals, VolumeFilter,
};
use crate::config::{ConfigError, IndicatorConfig};
use crate::data::MarketData;
use crate::hold::hold_until;
use crate::matrix::{BoolMatrix, MatrixError};

/// Buy/sell events computed from data available through each row's date.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSignals {
    pub buy: Event,
    pub sell: Event,
}

/// Buy/sell events moved forward one period: a row's value is the decision
/// taken on the previous row.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedSignals {
    buy: Event,
    sell: Event,
}

impl ComposedSignals {
    pub fn shifted(self) -> ShiftedSignals {
        ShiftedSignals {
            buy: self.buy.delay(1),
            sell: self.sell.delay(1),
        }
    }
}

impl ShiftedSignals {
    pub fn buy(&self) -> &Event {
        &self.buy
    }

    pub fn sell(&self) -> &Event {
        &self.sell
    }

    /// Continuous holding state derived from the shifted events.
    pub fn hold(&self) -> Result<BoolMatrix, MatrixError> {
        hold_until(&self.buy, &self.sell)
    }
}

/// Combine per-indicator conditions.
pub fn compose_signals(
    trend_buy_zone: &Condition,
    golden_cross: &Event,
    volume: &Condition,
    institutional_weak: &Condition,
    trend_sell: &Event,
    death_cross: &Event,
) -> Result<ComposedSignals, MatrixError> {
    let entry_zone = trend_buy_zone.and(volume)?.and(institutional_weak)?;
    let buy = golden_cross.gate(&entry_zone)?;
    let sell = trend_sell.or(death_cross)?;
    Ok(ComposedSignals { buy, sell })
}

/// Every per-indicator output, kept so callers can inspect why a signal fired.
#[derive(Debug, Clone)]
pub struct IndicatorConditions {
    pub trend: TrendZoneSignals,
    pub cross: CrossoverSignals,
    pub volume: Condition,
    pub flow: FlowSignals,
}

/// Builds and combines the indicator conditions of the trend/oscillator
/// strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalComposer {
    trend: TrendZone,
    volume: VolumeFilter,
    flow: InstitutionalFlow,
}

impl SignalComposer {
    pub fn new(trend: TrendZone, volume: VolumeFilter, flow: InstitutionalFlow) -> Self {
        Self {
            trend,
            volume,
            flow,
        }
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            TrendZone::from_config(config)?,
            VolumeFilter::from_config(config)?,
            InstitutionalFlow::from_config(config)?,
        ))
    }

    pub fn conditions(&self, data: &MarketData) -> Result<IndicatorConditions, MatrixError> {
        let trend = self.trend.evaluate(&data.sar, &data.adj_close)?;
        let cross = crossover(&data.macd_dif, &data.macd_dea)?;
        let volume = self.volume.evaluate(&data.volume)?;
        let flow = self
            .flow
            .evaluate(&data.foreign_net, &data.trust_net, &data.dealer_net)?;
        Ok(IndicatorConditions {
            trend,
            cross,
            volume,
            flow,
        })
    }

    pub fn compose(&self, data: &MarketData) -> Result<ComposedSignals, MatrixError> {
        Self::combine(&self.conditions(data)?)
    }

    /// Combine already evaluated conditions.
    pub fn combine(c: &IndicatorConditions) -> Result<ComposedSignals, MatrixError> {
        let signals = compose_signals(
            &c.trend.buy_zone,
            &c.cross.golden,
            &c.volume,
            &c.flow.weak,
            &c.trend.sell,
            &c.cross.death,
        )?;
        log::info!(
            "composed signals: {} buy events, {} sell events",
            signals.buy.matrix().count_true(),
            signals.sell.matrix().count_true()
        );
        Ok(signals)
    }
}
