//! Strategy configuration loaded from TOML.
//!
//! Every parameter travels inside one explicit `HoldlabConfig` value handed to
//! the strategy constructors. All fields have defaults, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! [indicator]
//! sar_max_dots = 2
//!
//! [allocation]
//! max_stocks = 10
//! start_date = "2020-01-01"
//!
//! [recommendation.weekly]
//! max_stocks = 5
//! buy_weekday = 1
//! sell_weekday = 5
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::conditions::VolumeFilter;
use crate::request::TradePrice;

pub const DEFAULT_FEE_RATIO: f64 = 0.001425;
pub const DEFAULT_TAX_RATIO: f64 = 0.003;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{field} must be a weekday between 1 (Monday) and 5 (Friday), got {value}")]
    InvalidWeekday { field: &'static str, value: u32 },

    #[error("capacity must be >= 1, got {0}")]
    InvalidCapacity(usize),

    #[error("trend zone needs 1 <= min_dots <= max_dots, got [{min}, {max}]")]
    InvalidDots { min: u32, max: u32 },

    #[error("{field} must be >= 1")]
    InvalidWindow { field: &'static str },

    #[error("{field} out of range: {value}")]
    InvalidRatio { field: &'static str, value: f64 },

    #[error("institutional thresholds need 1 <= weak <= strong <= 3, got weak={weak}, strong={strong}")]
    InvalidThreshold { weak: u8, strong: u8 },

    #[error("sweep range is empty: min_stocks={min} > max_stocks={max}")]
    EmptySweepRange { min: usize, max: usize },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HoldlabConfig {
    pub indicator: IndicatorConfig,
    pub allocation: AllocationConfig,
    pub recommendation: RecommendationConfig,
}

impl HoldlabConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicator.validate()?;
        self.allocation.validate()?;
        self.recommendation.weekly.validate()?;
        self.recommendation.monthly.validate()?;
        Ok(())
    }

    /// Content hash of the full configuration.
    ///
    /// Two runs with identical parameters share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

/// Parameters of the indicator-driven signal composition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Shortest below-price streak that still counts as a fresh trend.
    pub sar_min_dots: u32,
    /// Longest below-price streak that still counts as a fresh trend.
    pub sar_max_dots: u32,
    /// Lookback of the rolling new-high test.
    pub new_high_window: usize,
    /// Share of new-high days above which an instrument is a runaway.
    pub new_high_max_ratio: f64,
    pub volume_window: usize,
    pub volume_ratio_floor: f64,
    pub liquidity_floor: f64,
    pub surge_ceiling: f64,
    pub institutional_weak_threshold: u8,
    pub institutional_strong_threshold: u8,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sar_min_dots: 1,
            sar_max_dots: 2,
            new_high_window: 120,
            new_high_max_ratio: 0.3,
            volume_window: 30,
            volume_ratio_floor: 0.5,
            liquidity_floor: 1_000_000.0,
            surge_ceiling: 10.0,
            institutional_weak_threshold: 2,
            institutional_strong_threshold: 3,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sar_min_dots == 0 || self.sar_min_dots > self.sar_max_dots {
            return Err(ConfigError::InvalidDots {
                min: self.sar_min_dots,
                max: self.sar_max_dots,
            });
        }
        if self.new_high_window == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "new_high_window",
            });
        }
        if !(0.0..=1.0).contains(&self.new_high_max_ratio) {
            return Err(ConfigError::InvalidRatio {
                field: "new_high_max_ratio",
                value: self.new_high_max_ratio,
            });
        }
        VolumeFilter::from_config(self)?;
        let (weak, strong) = (
            self.institutional_weak_threshold,
            self.institutional_strong_threshold,
        );
        if weak == 0 || weak > strong || strong > 3 {
            return Err(ConfigError::InvalidThreshold { weak, strong });
        }
        Ok(())
    }
}

/// Parameters of the capacity-constrained allocation of the indicator strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AllocationConfig {
    pub max_stocks: usize,
    pub start_date: NaiveDate,
    pub fee_ratio: f64,
    pub tax_ratio: f64,
    pub trade_price: TradePrice,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_stocks: 10,
            start_date: default_start_date(),
            fee_ratio: DEFAULT_FEE_RATIO,
            tax_ratio: DEFAULT_TAX_RATIO,
            trade_price: TradePrice::Open,
        }
    }
}

impl AllocationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stocks == 0 {
            return Err(ConfigError::InvalidCapacity(0));
        }
        validate_cost("fee_ratio", self.fee_ratio)?;
        validate_cost("tax_ratio", self.tax_ratio)
    }
}

/// Recommendation tasks keyed by cadence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommendationConfig {
    pub weekly: TaskConfig,
    pub monthly: TaskConfig,
}

/// One recommendation task. Weekdays are 1-based: 1 = Monday … 5 = Friday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskConfig {
    /// `None` keeps every recommended instrument.
    pub max_stocks: Option<usize>,
    pub buy_weekday: u32,
    pub sell_weekday: u32,
    pub fee_ratio: f64,
    pub tax_ratio: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_stocks: Some(5),
            buy_weekday: 1,
            sell_weekday: 5,
            fee_ratio: DEFAULT_FEE_RATIO,
            tax_ratio: DEFAULT_TAX_RATIO,
        }
    }
}

impl TaskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stocks == Some(0) {
            return Err(ConfigError::InvalidCapacity(0));
        }
        validate_weekday("buy_weekday", self.buy_weekday)?;
        validate_weekday("sell_weekday", self.sell_weekday)?;
        validate_cost("fee_ratio", self.fee_ratio)?;
        validate_cost("tax_ratio", self.tax_ratio)
    }
}

pub(crate) fn validate_weekday(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeekday { field, value })
    }
}

fn validate_cost(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRatio { field, value })
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = HoldlabConfig::from_toml("").unwrap();
        assert_eq!(config, HoldlabConfig::default());
        assert_eq!(config.indicator.sar_max_dots, 2);
        assert_eq!(config.allocation.max_stocks, 10);
        assert_eq!(config.recommendation.weekly.max_stocks, Some(5));
        assert_eq!(config.allocation.trade_price, TradePrice::Open);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = HoldlabConfig::from_toml(
            r#"
[indicator]
sar_max_dots = 4

[allocation]
max_stocks = 4
start_date = "2021-06-01"

[recommendation.monthly]
buy_weekday = 2
sell_weekday = 4
"#,
        )
        .unwrap();

        assert_eq!(config.indicator.sar_max_dots, 4);
        assert_eq!(config.indicator.volume_window, 30);
        assert_eq!(config.allocation.max_stocks, 4);
        assert_eq!(
            config.allocation.start_date,
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
        assert_eq!(config.recommendation.monthly.buy_weekday, 2);
        assert_eq!(config.recommendation.weekly.buy_weekday, 1);
    }

    #[test]
    fn rejects_weekday_out_of_range() {
        let err = HoldlabConfig::from_toml("[recommendation.weekly]\nsell_weekday = 7\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidWeekday {
                field: "sell_weekday",
                value: 7
            }
        ));
        assert!(err.to_string().contains("between 1 (Monday) and 5 (Friday)"));
    }

    #[test]
    fn rejects_zero_weekday() {
        let err = HoldlabConfig::from_toml("[recommendation.monthly]\nbuy_weekday = 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeekday { value: 0, .. }));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = HoldlabConfig::from_toml("[allocation]\nmax_stocks = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn rejects_inverted_dots() {
        let err = HoldlabConfig::from_toml("[indicator]\nsar_min_dots = 3\nsar_max_dots = 2\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDots { min: 3, max: 2 }));
    }

    #[test]
    fn rejects_bad_thresholds() {
        let err = HoldlabConfig::from_toml(
            "[indicator]\ninstitutional_weak_threshold = 4\ninstitutional_strong_threshold = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { weak: 4, strong: 3 }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = HoldlabConfig::from_toml("[allocation\nmax_stocks = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fingerprint_tracks_parameters() {
        let a = HoldlabConfig::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.indicator.sar_max_dots = 3;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }
}
