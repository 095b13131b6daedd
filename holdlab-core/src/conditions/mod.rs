//! Per-indicator conditions.
//!
//! Two kinds of boolean matrix flow out of here and they are kept apart:
//! - [`Condition`]: a sustained state (price above a level, liquid enough, ...)
//!   that holds on every row where it is true.
//! - [`Event`]: an instantaneous transition that is true only on the row where
//!   it happens (a crossover, a flip).
//!
//! Mixing the two needs an explicit step: [`Event::gate`] keeps an event only on
//! rows where a condition also holds, [`Condition::onsets`] and
//! [`Condition::releases`] turn a state into the events that start or end it.

pub mod crossover;
pub mod institutional;
pub mod trend;
pub mod volume;

pub use crossover::{crossover, CrossoverSignals};
pub use institutional::{FlowSignals, InstitutionalFlow};
pub use trend::{RunawayFilter, TrendZone, TrendZoneSignals};
pub use volume::VolumeFilter;

use crate::matrix::{BoolMatrix, MatrixError};

/// A sustained boolean state.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(BoolMatrix);

impl Condition {
    pub fn new(matrix: BoolMatrix) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> &BoolMatrix {
        &self.0
    }

    pub fn and(&self, other: &Condition) -> Result<Condition, MatrixError> {
        self.0.and(&other.0).map(Condition)
    }

    pub fn negate(&self) -> Condition {
        Condition(self.0.not())
    }

    /// Rows where the state starts: true today, false yesterday. Row 0 has no
    /// yesterday and never fires.
    pub fn onsets(&self) -> Event {
        Event(self.0.map_columns(|col| edges(col, |prev, cur| !prev && cur)))
    }

    /// Rows where the state ends: false today, true yesterday. Row 0 never
    /// fires.
    pub fn releases(&self) -> Event {
        Event(self.0.map_columns(|col| edges(col, |prev, cur| prev && !cur)))
    }
}

/// An instantaneous boolean event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event(BoolMatrix);

impl Event {
    pub fn new(matrix: BoolMatrix) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> &BoolMatrix {
        &self.0
    }

    /// Either event fires.
    pub fn or(&self, other: &Event) -> Result<Event, MatrixError> {
        self.0.or(&other.0).map(Event)
    }

    /// Keep the event only on rows where `condition` holds.
    pub fn gate(&self, condition: &Condition) -> Result<Event, MatrixError> {
        self.0.and(&condition.0).map(Event)
    }

    /// Treat each event day as a one-day state.
    pub fn as_condition(&self) -> Condition {
        Condition(self.0.clone())
    }

    /// Move every event `periods` rows later; the vacated head is quiet.
    pub fn delay(&self, periods: usize) -> Event {
        Event(self.0.shift(periods as isize, false))
    }
}

fn edges(col: &[bool], fires: impl Fn(bool, bool) -> bool) -> Vec<bool> {
    let mut out = vec![false; col.len()];
    for i in 1..col.len() {
        out[i] = fires(col[i - 1], col[i]);
    }
    out
}
