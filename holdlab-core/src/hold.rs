//! Hold-until: turns discrete buy/sell events into a continuous holding state.
//!
//! Each instrument runs an independent two-state machine starting `Flat`.
//! When both events fire on the same row the current state decides: a flat
//! instrument enters (the sell is a no-op), a held instrument exits.

use crate::conditions::Event;
use crate::matrix::{BoolMatrix, MatrixError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    Flat,
    Held,
}

impl HoldState {
    pub fn step(self, buy: bool, sell: bool) -> HoldState {
        match self {
            HoldState::Flat if buy => HoldState::Held,
            HoldState::Held if sell => HoldState::Flat,
            state => state,
        }
    }

    pub fn is_held(self) -> bool {
        self == HoldState::Held
    }
}

/// Run the state machine down one column.
pub fn hold_column(buy: &[bool], sell: &[bool]) -> Vec<bool> {
    debug_assert_eq!(buy.len(), sell.len());
    let mut state = HoldState::Flat;
    buy.iter()
        .zip(sell)
        .map(|(&b, &s)| {
            state = state.step(b, s);
            state.is_held()
        })
        .collect()
}

/// Holding state for every instrument. `buy` and `sell` must share axes.
pub fn hold_until(buy: &Event, sell: &Event) -> Result<BoolMatrix, MatrixError> {
    buy.matrix().zip_columns_with(sell.matrix(), hold_column)
}
