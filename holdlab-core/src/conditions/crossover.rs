//! Oscillator line crossovers (MACD DIF vs. signal).

use crate::matrix::{FloatMatrix, MatrixError};

use super::Event;

#[derive(Debug, Clone)]
pub struct CrossoverSignals {
    /// Fast line crosses above the slow line.
    pub golden: Event,
    /// Fast line crosses below the slow line.
    pub death: Event,
}

/// Golden and death crosses of `fast` against `slow`.
///
/// A cross needs both today and yesterday to be known: a NaN on either day of
/// either line suppresses it, and row 0 never fires.
pub fn crossover(fast: &FloatMatrix, slow: &FloatMatrix) -> Result<CrossoverSignals, MatrixError> {
    let golden = fast.zip_columns_with(slow, |f, s| {
        cross_column(f, s, |f_prev, s_prev, f_now, s_now| {
            f_now > s_now && f_prev <= s_prev
        })
    })?;
    let death = fast.zip_columns_with(slow, |f, s| {
        cross_column(f, s, |f_prev, s_prev, f_now, s_now| {
            f_now < s_now && f_prev >= s_prev
        })
    })?;
    Ok(CrossoverSignals {
        golden: Event::new(golden),
        death: Event::new(death),
    })
}

fn cross_column(
    fast: &[f64],
    slow: &[f64],
    fires: impl Fn(f64, f64, f64, f64) -> bool,
) -> Vec<bool> {
    let mut out = vec![false; fast.len()];
    for i in 1..fast.len() {
        // NaN compares false, so any missing value keeps the cell quiet.
        out[i] = fires(fast[i - 1], slow[i - 1], fast[i], slow[i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::test_support::*;

    #[test]
    fn golden_and_death() {
        let fast = matrix(&[vec![1.0, 3.0, 3.0, 1.0, 2.0]]);
        let slow = matrix(&[vec![2.0, 2.0, 2.0, 2.0, 2.0]]);
        let out = crossover(&fast, &slow).unwrap();
        assert_eq!(
            out.golden.matrix().column(0),
            &[false, true, false, false, false]
        );
        assert_eq!(
            out.death.matrix().column(0),
            &[false, false, false, true, false]
        );
    }

    #[test]
    fn touching_then_crossing_counts() {
        let fast = matrix(&[vec![2.0, 3.0]]);
        let slow = matrix(&[vec![2.0, 2.0]]);
        assert!(crossover(&fast, &slow).unwrap().golden.matrix().column(0)[1]);
    }

    #[test]
    fn missing_yesterday_suppresses_cross() {
        let fast = matrix(&[vec![f64::NAN, 3.0, 1.0]]);
        let slow = matrix(&[vec![2.0, 2.0, f64::NAN]]);
        let out = crossover(&fast, &slow).unwrap();
        assert_eq!(out.golden.matrix().column(0), &[false, false, false]);
        assert_eq!(out.death.matrix().column(0), &[false, false, false]);
    }

    #[test]
    fn row_zero_never_fires() {
        let fast = matrix(&[vec![3.0]]);
        let slow = matrix(&[vec![2.0]]);
        assert!(!crossover(&fast, &slow).unwrap().golden.matrix().column(0)[0]);
    }
}
