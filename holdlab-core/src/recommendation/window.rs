//! Weekday trading window.

use chrono::{Datelike, NaiveDate};

use crate::config::{validate_weekday, ConfigError};
use crate::matrix::BoolMatrix;

/// Calendar days on which a recommendation position may be held, between the
/// buy weekday (inclusive) and the sell weekday (exclusive).
///
/// Weekdays are 1-based on input (1 = Monday … 5 = Friday). When the sell day
/// comes before the buy day the window wraps across the weekend. Equal days
/// mean no mask at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    buy: u32,
    sell: u32,
}

impl TradingWindow {
    pub fn new(buy_weekday: u32, sell_weekday: u32) -> Result<Self, ConfigError> {
        validate_weekday("buy_weekday", buy_weekday)?;
        validate_weekday("sell_weekday", sell_weekday)?;
        Ok(Self {
            buy: buy_weekday - 1,
            sell: sell_weekday - 1,
        })
    }

    pub fn is_unmasked(&self) -> bool {
        self.buy == self.sell
    }

    pub fn is_open(&self, date: NaiveDate) -> bool {
        let dow = date.weekday().num_days_from_monday();
        match self.buy.cmp(&self.sell) {
            std::cmp::Ordering::Equal => true,
            std::cmp::Ordering::Less => dow >= self.buy && dow < self.sell,
            std::cmp::Ordering::Greater => dow >= self.buy || dow < self.sell,
        }
    }

    /// Clear every row dated outside the window.
    pub fn apply(&self, position: &BoolMatrix) -> BoolMatrix {
        if self.is_unmasked() {
            return position.clone();
        }
        let open: Vec<bool> = position.index().iter().map(|d| self.is_open(*d)).collect();
        position.map_columns(|col| col.iter().zip(&open).map(|(v, o)| *v && *o).collect())
    }
}
