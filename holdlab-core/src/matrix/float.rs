//! Float helpers over `FloatMatrix`. NaN marks a missing value.
//!
//! Rolling windows need `window` consecutive non-missing values; anything less
//! yields NaN. Comparisons involving NaN are False, so a missing input reads as
//! "no signal" downstream.

use std::collections::VecDeque;

use super::{BoolMatrix, FloatMatrix, MatrixError};

impl FloatMatrix {
    /// Trailing mean over `window` rows (current row included). A zero
    /// window never fills, so every cell is NaN.
    pub fn rolling_mean(&self, window: usize) -> FloatMatrix {
        if window == 0 {
            return self.map(|_| f64::NAN);
        }
        self.map_columns(|col| rolling_mean(col, window))
    }

    /// Trailing maximum over `window` rows (current row included). A zero
    /// window yields all NaN.
    pub fn rolling_max(&self, window: usize) -> FloatMatrix {
        if window == 0 {
            return self.map(|_| f64::NAN);
        }
        self.map_columns(|col| rolling_max(col, window))
    }

    pub fn gt(&self, other: &FloatMatrix) -> Result<BoolMatrix, MatrixError> {
        self.zip_with(other, |a, b| a > b)
    }

    pub fn ge(&self, other: &FloatMatrix) -> Result<BoolMatrix, MatrixError> {
        self.zip_with(other, |a, b| a >= b)
    }

    pub fn lt(&self, other: &FloatMatrix) -> Result<BoolMatrix, MatrixError> {
        self.zip_with(other, |a, b| a < b)
    }

    pub fn gt_scalar(&self, threshold: f64) -> BoolMatrix {
        self.map(|v| *v > threshold)
    }
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let mut sum = 0.0;
    let mut nan_in_window = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_in_window += 1;
        } else {
            sum += entering;
        }

        if i >= window {
            let leaving = values[i - window];
            if leaving.is_nan() {
                nan_in_window -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= window && nan_in_window == 0 {
            result[i] = sum / window as f64;
        }
    }

    result
}

fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    // Indices of candidate maxima, values strictly decreasing front to back.
    let mut candidates: VecDeque<usize> = VecDeque::new();
    let mut last_nan: Option<usize> = None;

    for i in 0..n {
        let v = values[i];
        if v.is_nan() {
            last_nan = Some(i);
        } else {
            while candidates.back().is_some_and(|&j| values[j] <= v) {
                candidates.pop_back();
            }
            candidates.push_back(i);
        }

        while candidates.front().is_some_and(|&j| j + window <= i) {
            candidates.pop_front();
        }

        let window_start = (i + 1).saturating_sub(window);
        let clean = last_nan.map_or(true, |j| j < window_start);
        if i + 1 >= window && clean {
            if let Some(&j) = candidates.front() {
                result[i] = values[j];
            }
        }
    }

    result
}
