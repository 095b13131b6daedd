//! Institutional-flow agreement across three classes of large participants.

use crate::config::{ConfigError, IndicatorConfig};
use crate::matrix::{CountMatrix, FloatMatrix, MatrixError};

use super::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstitutionalFlow {
    weak: u32,
    strong: u32,
}

#[derive(Debug, Clone)]
pub struct FlowSignals {
    /// Number of series with a positive net buy on each date (0..=3).
    pub count: CountMatrix,
    pub strong: Condition,
    pub weak: Condition,
}

impl InstitutionalFlow {
    pub fn new(weak: u8, strong: u8) -> Result<Self, ConfigError> {
        if weak == 0 || weak > strong || strong > 3 {
            return Err(ConfigError::InvalidThreshold { weak, strong });
        }
        Ok(Self {
            weak: u32::from(weak),
            strong: u32::from(strong),
        })
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.institutional_weak_threshold,
            config.institutional_strong_threshold,
        )
    }

    pub fn evaluate(
        &self,
        a: &FloatMatrix,
        b: &FloatMatrix,
        c: &FloatMatrix,
    ) -> Result<FlowSignals, MatrixError> {
        let positive = |v: &f64| u32::from(*v > 0.0);
        let ab = a.zip_with(b, |x, y| positive(x) + positive(y))?;
        let count = ab.zip_with(c, |n, z| n + positive(z))?;

        let (weak, strong) = (self.weak, self.strong);
        Ok(FlowSignals {
            strong: Condition::new(count.map(|n| *n >= strong)),
            weak: Condition::new(count.map(|n| *n >= weak)),
            count,
        })
    }
}
