//! Capacity allocator: caps the number of concurrently held instruments.
//!
//! Selection is literal: on each date the first K eligible
//! instruments in column order are kept. Nothing ranks candidates by signal
//! strength, so reordering the columns changes which instruments win.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ConfigError;
use crate::matrix::{BoolMatrix, FloatMatrix};

/// Maximum number of concurrently held instruments (K >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Capacity(usize);

impl Capacity {
    pub fn new(k: usize) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::InvalidCapacity(k));
        }
        Ok(Self(k))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Weight of one slot. Fixed at 1/K however many slots a date fills.
    pub fn slot_weight(self) -> f64 {
        1.0 / self.0 as f64
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keep, on every row, only the first `k` true cells in column order.
pub fn keep_first_k(eligible: &BoolMatrix, k: usize) -> BoolMatrix {
    let mut taken = vec![0usize; eligible.n_rows()];
    let columns: Vec<Vec<bool>> = eligible
        .iter_columns()
        .map(|(_, col)| {
            col.iter()
                .zip(taken.iter_mut())
                .map(|(&on, used)| {
                    if on && *used < k {
                        *used += 1;
                        true
                    } else {
                        false
                    }
                })
                .collect()
        })
        .collect();
    eligible.with_values(columns)
}

/// Per-date outcome of the allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRecord {
    pub date: NaiveDate,
    pub instruments: Vec<String>,
    pub slot_weight: f64,
}

/// Selected instruments for every date under a capacity cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    selected: BoolMatrix,
    capacity: Capacity,
}

impl Allocation {
    pub fn selected(&self) -> &BoolMatrix {
        &self.selected
    }

    /// `1/K` on selected cells, `0.0` elsewhere.
    pub fn weights(&self) -> FloatMatrix {
        let w = self.capacity.slot_weight();
        self.selected.map(|on| if *on { w } else { 0.0 })
    }

    /// One record per date, listing the selected instruments in column order.
    pub fn records(&self) -> Vec<AllocationRecord> {
        let slot_weight = self.capacity.slot_weight();
        self.selected
            .index()
            .iter()
            .enumerate()
            .map(|(row, date)| AllocationRecord {
                date: *date,
                instruments: self
                    .selected
                    .true_columns(row)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                slot_weight,
            })
            .collect()
    }
}

pub fn allocate(eligible: &BoolMatrix, capacity: Capacity) -> Allocation {
    let selected = keep_first_k(eligible, capacity.get());
    log::debug!(
        "allocated {} of {} eligible instrument-days at capacity {}",
        selected.count_true(),
        eligible.count_true(),
        capacity
    );
    Allocation { selected, capacity }
}

/// Keep only the `id` column's values; every other instrument is false.
/// Returns `None` when `id` is not in the universe.
pub fn isolate_column(matrix: &BoolMatrix, id: &str) -> Option<BoolMatrix> {
    let keep = matrix.position(id)?;
    let values = (0..matrix.n_cols())
        .map(|col| {
            if col == keep {
                matrix.column(col).to_vec()
            } else {
                vec![false; matrix.n_rows()]
            }
        })
        .collect();
    Some(matrix.with_values(values))
}
