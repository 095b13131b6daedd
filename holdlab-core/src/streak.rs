//! Run-length of consecutive True values per instrument column.
//!
//! `streak[t, c]` counts the True values in column `c` ending at and including
//! row `t`. Any False resets the count to 0 on that row. Missing inputs are
//! already False by the time they reach a `BoolMatrix`.

use crate::matrix::{BoolMatrix, CountMatrix};

/// Streak lengths for every column of `condition`.
pub fn streak(condition: &BoolMatrix) -> CountMatrix {
    condition.map_columns(streak_column)
}

/// Streak lengths for a single column.
pub fn streak_column(values: &[bool]) -> Vec<u32> {
    let mut run = 0u32;
    values
        .iter()
        .map(|&v| {
            run = if v { run.saturating_add(1) } else { 0 };
            run
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::test_support::*;

    #[test]
    fn counts_runs_and_resets() {
        let out = streak_column(&[true, true, false, true, true, true, false]);
        assert_eq!(out, vec![1, 2, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn all_false_is_all_zero() {
        assert_eq!(streak_column(&[false; 4]), vec![0; 4]);
    }

    #[test]
    fn empty_column() {
        assert!(streak_column(&[]).is_empty());
    }

    #[test]
    fn columns_are_independent() {
        let m = matrix(&[vec![true, true, true], vec![false, true, true]]);
        let s = streak(&m);
        assert_eq!(s.column(0), &[1, 2, 3]);
        assert_eq!(s.column(1), &[0, 1, 2]);
    }
}
