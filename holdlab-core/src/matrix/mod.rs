//! Date × instrument matrices.
//!
//! Rows are strictly ascending trading dates, columns are unique instrument ids.
//! Storage is column-major: every instrument owns one contiguous `Vec<T>`, so
//! per-instrument transforms (streaks, crossovers, hold-until) never read a
//! neighbouring column.
//!
//! Matrices are never aligned implicitly. Combining two matrices requires an
//! identical index and column list; callers reindex explicitly first.

mod boolean;
mod float;

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub type BoolMatrix = TimeSeriesMatrix<bool>;
pub type FloatMatrix = TimeSeriesMatrix<f64>;
pub type CountMatrix = TimeSeriesMatrix<u32>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("row index not strictly ascending at row {row} ({date})")]
    UnsortedIndex { row: usize, date: NaiveDate },

    #[error("duplicate column id: {0}")]
    DuplicateColumn(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("axis mismatch: matrices must share an identical index and column list (reindex first)")]
    AxisMismatch,
}

/// A date-indexed, instrument-keyed matrix of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesMatrix<T> {
    index: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<T>>,
}

impl<T> TimeSeriesMatrix<T> {
    /// Build a matrix from column-major values (`values[col][row]`).
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<T>>,
    ) -> Result<Self, MatrixError> {
        validate_index(&index)?;
        validate_columns(&columns)?;

        if values.len() != columns.len() {
            return Err(MatrixError::ShapeMismatch(format!(
                "{} columns named but {} value columns given",
                columns.len(),
                values.len()
            )));
        }
        if let Some((c, col)) = values
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != index.len())
        {
            return Err(MatrixError::ShapeMismatch(format!(
                "column '{}' has {} rows, index has {}",
                columns[c],
                col.len(),
                index.len()
            )));
        }

        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Build a matrix by evaluating `f(row, col)` for every cell.
    pub fn from_fn(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Result<Self, MatrixError> {
        validate_index(&index)?;
        validate_columns(&columns)?;

        let n_rows = index.len();
        let values = (0..columns.len())
            .map(|c| (0..n_rows).map(|r| f(r, c)).collect())
            .collect();

        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn column(&self, col: usize) -> &[T] {
        &self.values[col]
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == id)
    }

    pub fn column_by_id(&self, id: &str) -> Option<&[T]> {
        self.position(id).map(|c| self.values[c].as_slice())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.values.get(col).and_then(|v| v.get(row))
    }

    /// Iterate `(instrument_id, column values)` in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(id, v)| (id.as_str(), v.as_slice()))
    }

    /// True when both matrices share an identical index and column list.
    pub fn same_axes<U>(&self, other: &TimeSeriesMatrix<U>) -> bool {
        self.index == other.index && self.columns == other.columns
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> TimeSeriesMatrix<U> {
        TimeSeriesMatrix {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|col| col.iter().map(&f).collect())
                .collect(),
        }
    }

    /// Transform every column independently. `f` must preserve the row count.
    pub fn map_columns<U>(&self, f: impl Fn(&[T]) -> Vec<U>) -> TimeSeriesMatrix<U> {
        let values: Vec<Vec<U>> = self.values.iter().map(|col| f(col.as_slice())).collect();
        debug_assert!(values.iter().all(|v| v.len() == self.index.len()));
        TimeSeriesMatrix {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Same axes as `self`, new column-major values.
    pub(crate) fn with_values<U>(&self, values: Vec<Vec<U>>) -> TimeSeriesMatrix<U> {
        debug_assert_eq!(values.len(), self.columns.len());
        debug_assert!(values.iter().all(|v| v.len() == self.index.len()));
        TimeSeriesMatrix {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Cell-wise combination of two matrices on identical axes.
    pub fn zip_with<U, V>(
        &self,
        other: &TimeSeriesMatrix<U>,
        f: impl Fn(&T, &U) -> V,
    ) -> Result<TimeSeriesMatrix<V>, MatrixError> {
        self.zip_columns_with(other, |a, b| {
            a.iter().zip(b.iter()).map(|(x, y)| f(x, y)).collect()
        })
    }

    /// Column-wise combination of two matrices on identical axes.
    pub fn zip_columns_with<U, V>(
        &self,
        other: &TimeSeriesMatrix<U>,
        f: impl Fn(&[T], &[U]) -> Vec<V>,
    ) -> Result<TimeSeriesMatrix<V>, MatrixError> {
        if !self.same_axes(other) {
            return Err(MatrixError::AxisMismatch);
        }
        let values: Vec<Vec<V>> = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| f(a.as_slice(), b.as_slice()))
            .collect();
        debug_assert!(values.iter().all(|v| v.len() == self.index.len()));
        Ok(TimeSeriesMatrix {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values,
        })
    }
}

impl<T: Clone> TimeSeriesMatrix<T> {
    pub fn filled(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        value: T,
    ) -> Result<Self, MatrixError> {
        Self::from_fn(index, columns, |_, _| value.clone())
    }

    /// Values of one row in column order.
    pub fn row(&self, row: usize) -> Vec<T> {
        self.values.iter().map(|col| col[row].clone()).collect()
    }

    /// Shift rows by `periods`: positive moves values forward in time (row `t`
    /// receives row `t - periods`), negative moves them backward. Vacated rows
    /// take `fill`.
    pub fn shift(&self, periods: isize, fill: T) -> Self {
        let n = self.n_rows() as isize;
        let values = self
            .values
            .iter()
            .map(|col| {
                (0..n)
                    .map(|r| {
                        let src = r - periods;
                        if (0..n).contains(&src) {
                            col[src as usize].clone()
                        } else {
                            fill.clone()
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Realign onto a new index and column list. Cells with no counterpart in
    /// `self` take `fill`.
    pub fn reindex(
        &self,
        index: &[NaiveDate],
        columns: &[String],
        fill: T,
    ) -> Result<Self, MatrixError> {
        let row_of: HashMap<NaiveDate, usize> =
            self.index.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let rows: Vec<Option<usize>> = index.iter().map(|d| row_of.get(d).copied()).collect();
        self.gather(index, columns, &rows, fill)
    }

    /// Realign onto a new index, carrying the latest row at-or-before each new
    /// date forward. Dates before the first row take `fill`.
    pub fn reindex_ffill(
        &self,
        index: &[NaiveDate],
        columns: &[String],
        fill: T,
    ) -> Result<Self, MatrixError> {
        let rows: Vec<Option<usize>> = index
            .iter()
            .map(|d| self.index.partition_point(|x| x <= d).checked_sub(1))
            .collect();
        self.gather(index, columns, &rows, fill)
    }

    /// Keep the row index, realign the columns.
    pub fn reindex_columns(&self, columns: &[String], fill: T) -> Result<Self, MatrixError> {
        let rows: Vec<Option<usize>> = (0..self.n_rows()).map(Some).collect();
        let index = self.index.clone();
        self.gather(&index, columns, &rows, fill)
    }

    /// Rows dated on or after `start`.
    pub fn slice_from(&self, start: NaiveDate) -> Self {
        let first = self.index.partition_point(|d| *d < start);
        Self {
            index: self.index[first..].to_vec(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|col| col[first..].to_vec()).collect(),
        }
    }

    fn gather(
        &self,
        index: &[NaiveDate],
        columns: &[String],
        rows: &[Option<usize>],
        fill: T,
    ) -> Result<Self, MatrixError> {
        validate_index(index)?;
        validate_columns(columns)?;

        let col_of: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let values = columns
            .iter()
            .map(|id| match col_of.get(id.as_str()) {
                Some(&c) => rows
                    .iter()
                    .map(|r| match r {
                        Some(r) => self.values[c][*r].clone(),
                        None => fill.clone(),
                    })
                    .collect(),
                None => vec![fill.clone(); index.len()],
            })
            .collect();

        Ok(Self {
            index: index.to_vec(),
            columns: columns.to_vec(),
            values,
        })
    }
}

fn validate_index(index: &[NaiveDate]) -> Result<(), MatrixError> {
    match index.windows(2).position(|w| w[0] >= w[1]) {
        Some(i) => Err(MatrixError::UnsortedIndex {
            row: i + 1,
            date: index[i + 1],
        }),
        None => Ok(()),
    }
}

fn validate_columns(columns: &[String]) -> Result<(), MatrixError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for c in columns {
        if !seen.insert(c.as_str()) {
            return Err(MatrixError::DuplicateColumn(c.clone()));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn rejects_unsorted_index() {
        let err = TimeSeriesMatrix::new(vec![day(1), day(0)], ids(&["A"]), vec![vec![1, 2]])
            .unwrap_err();
        assert_eq!(
            err,
            MatrixError::UnsortedIndex {
                row: 1,
                date: day(0)
            }
        );
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = TimeSeriesMatrix::new(vec![day(0), day(0)], ids(&["A"]), vec![vec![1, 2]]);
        assert!(matches!(err, Err(MatrixError::UnsortedIndex { .. })));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = TimeSeriesMatrix::new(days(1), ids(&["A", "A"]), vec![vec![1], vec![2]]);
        assert_eq!(err, Err(MatrixError::DuplicateColumn("A".into())));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = TimeSeriesMatrix::new(days(2), ids(&["A", "B"]), vec![vec![1, 2], vec![3]]);
        assert!(matches!(err, Err(MatrixError::ShapeMismatch(_))));
    }

    #[test]
    fn shift_forward_fills_head() {
        let m = matrix(&[vec![1, 2, 3]]);
        assert_eq!(m.shift(1, 0).column(0), &[0, 1, 2]);
    }

    #[test]
    fn shift_backward_fills_tail() {
        let m = matrix(&[vec![1, 2, 3]]);
        assert_eq!(m.shift(-1, 0).column(0), &[2, 3, 0]);
    }

    #[test]
    fn shift_beyond_length_is_all_fill() {
        let m = matrix(&[vec![1, 2, 3]]);
        assert_eq!(m.shift(5, 9).column(0), &[9, 9, 9]);
    }

    #[test]
    fn zip_requires_identical_axes() {
        let a = matrix(&[vec![1, 2]]);
        let b = TimeSeriesMatrix::new(days(2), ids(&["X"]), vec![vec![1, 2]]).unwrap();
        assert_eq!(a.zip_with(&b, |x, y| x + y), Err(MatrixError::AxisMismatch));
    }

    #[test]
    fn reindex_fills_unknown_cells() {
        let m = matrix(&[vec![1, 2]]);
        let out = m
            .reindex(&[day(1), day(2)], &ids(&["S1", "Z"]), 0)
            .unwrap();
        assert_eq!(out.column(0), &[2, 0]);
        assert_eq!(out.column(1), &[0, 0]);
    }

    #[test]
    fn reindex_ffill_carries_last_row() {
        let m = TimeSeriesMatrix::new(vec![day(2), day(5)], ids(&["A"]), vec![vec![1, 2]]).unwrap();
        let out = m.reindex_ffill(&days(8), &ids(&["A"]), 0).unwrap();
        assert_eq!(out.column(0), &[0, 0, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn reindex_columns_drops_and_adds() {
        let m = matrix(&[vec![1, 2], vec![3, 4]]);
        let out = m.reindex_columns(&ids(&["S2", "S9"]), -1).unwrap();
        assert_eq!(out.columns(), &ids(&["S2", "S9"])[..]);
        assert_eq!(out.column(0), &[3, 4]);
        assert_eq!(out.column(1), &[-1, -1]);
    }

    #[test]
    fn slice_from_drops_earlier_rows() {
        let m = matrix(&[vec![1, 2, 3, 4]]);
        let out = m.slice_from(day(2));
        assert_eq!(out.index(), &[day(2), day(3)]);
        assert_eq!(out.column(0), &[3, 4]);
    }

    #[test]
    fn row_reads_across_columns() {
        let m = matrix(&[vec![1, 2], vec![3, 4]]);
        assert_eq!(m.row(1), vec![2, 4]);
        assert_eq!(m.column_by_id("S2"), Some(&[3, 4][..]));
        assert_eq!(m.column_by_id("nope"), None);
    }
}
