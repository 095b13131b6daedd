//! Liquidity gate on traded volume.

use crate::config::{ConfigError, IndicatorConfig};
use crate::matrix::{FloatMatrix, MatrixError};

use super::Condition;

/// Passes days whose volume is neither thin, illiquid, nor an abnormal spike
/// relative to the trailing mean.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFilter {
    window: usize,
    ratio_floor: f64,
    liquidity_floor: f64,
    surge_ceiling: f64,
}

impl Default for VolumeFilter {
    fn default() -> Self {
        Self {
            window: 30,
            ratio_floor: 0.5,
            liquidity_floor: 1_000_000.0,
            surge_ceiling: 10.0,
        }
    }
}

impl VolumeFilter {
    /// Floors must be finite and non-negative, and the surge ceiling must sit
    /// above the ratio floor or no day could pass.
    pub fn new(
        window: usize,
        ratio_floor: f64,
        liquidity_floor: f64,
        surge_ceiling: f64,
    ) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "volume_window",
            });
        }
        for (field, value) in [
            ("volume_ratio_floor", ratio_floor),
            ("liquidity_floor", liquidity_floor),
            ("surge_ceiling", surge_ceiling),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRatio { field, value });
            }
        }
        if surge_ceiling <= ratio_floor {
            return Err(ConfigError::InvalidRatio {
                field: "surge_ceiling",
                value: surge_ceiling,
            });
        }
        Ok(Self {
            window,
            ratio_floor,
            liquidity_floor,
            surge_ceiling,
        })
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.volume_window,
            config.volume_ratio_floor,
            config.liquidity_floor,
            config.surge_ceiling,
        )
    }

    pub fn evaluate(&self, volume: &FloatMatrix) -> Result<Condition, MatrixError> {
        let mean = volume.rolling_mean(self.window);
        let pass = volume.zip_columns_with(&mean, |vol, avg| {
            vol.iter()
                .zip(avg)
                .map(|(&v, &m)| {
                    v > self.ratio_floor * m
                        && m > self.liquidity_floor
                        && v < self.surge_ceiling * m
                })
                .collect()
        })?;
        Ok(Condition::new(pass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::test_support::*;

    fn filter() -> VolumeFilter {
        VolumeFilter::new(2, 0.5, 100.0, 10.0).unwrap()
    }

    #[test]
    fn needs_full_window() {
        let volume = matrix(&[vec![1_000.0, 1_000.0, 1_000.0]]);
        assert_eq!(
            filter().evaluate(&volume).unwrap().matrix().column(0),
            &[false, true, true]
        );
    }

    #[test]
    fn rejects_thin_day() {
        // mean(1000, 200) = 600; 200 < 0.5 * 600
        let volume = matrix(&[vec![1_000.0, 200.0]]);
        assert!(!filter().evaluate(&volume).unwrap().matrix().column(0)[1]);
    }

    #[test]
    fn rejects_illiquid_instrument() {
        let volume = matrix(&[vec![50.0, 50.0]]);
        assert!(!filter().evaluate(&volume).unwrap().matrix().column(0)[1]);
    }

    #[test]
    fn rejects_surge() {
        let f = VolumeFilter::new(3, 0.5, 100.0, 2.0).unwrap();
        // mean(200, 200, 2000) = 800; 2000 >= 2 * 800
        let volume = matrix(&[vec![200.0, 200.0, 2_000.0]]);
        assert!(!f.evaluate(&volume).unwrap().matrix().column(0)[2]);
    }

    #[test]
    fn missing_volume_is_no_signal() {
        let volume = matrix(&[vec![1_000.0, f64::NAN, 1_000.0]]);
        assert_eq!(
            filter().evaluate(&volume).unwrap().matrix().column(0),
            &[false, false, false]
        );
    }

    #[test]
    fn rejects_zero_window() {
        let err = VolumeFilter::new(0, 0.5, 100.0, 10.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidWindow {
                field: "volume_window"
            }
        ));
    }

    #[test]
    fn rejects_bad_floors() {
        assert!(VolumeFilter::new(2, -0.1, 100.0, 10.0).is_err());
        assert!(VolumeFilter::new(2, 0.5, f64::NAN, 10.0).is_err());
        // Ceiling at or below the floor leaves an empty band.
        assert!(VolumeFilter::new(2, 0.5, 100.0, 0.5).is_err());
    }

    #[test]
    fn from_config_validates() {
        let config = IndicatorConfig {
            volume_window: 0,
            ..IndicatorConfig::default()
        };
        assert!(VolumeFilter::from_config(&config).is_err());
        assert_eq!(
            VolumeFilter::from_config(&IndicatorConfig::default()).unwrap(),
            VolumeFilter::default()
        );
    }
}
