//! Boolean algebra over `BoolMatrix`.

use super::{BoolMatrix, FloatMatrix, MatrixError};

impl BoolMatrix {
    pub fn and(&self, other: &BoolMatrix) -> Result<BoolMatrix, MatrixError> {
        self.zip_with(other, |a, b| *a && *b)
    }

    pub fn or(&self, other: &BoolMatrix) -> Result<BoolMatrix, MatrixError> {
        self.zip_with(other, |a, b| *a || *b)
    }

    pub fn not(&self) -> BoolMatrix {
        self.map(|v| !*v)
    }

    /// Whether the column was True on any row.
    pub fn any_in_column(&self, col: usize) -> bool {
        self.column(col).iter().any(|v| *v)
    }

    /// Number of columns that were True on at least one row.
    pub fn columns_with_any(&self) -> usize {
        (0..self.n_cols()).filter(|&c| self.any_in_column(c)).count()
    }

    /// Number of True cells in one row.
    pub fn count_row(&self, row: usize) -> usize {
        (0..self.n_cols())
            .filter(|&c| self.column(c)[row])
            .count()
    }

    /// Number of True cells in the whole matrix.
    pub fn count_true(&self) -> usize {
        (0..self.n_cols())
            .map(|c| self.column(c).iter().filter(|v| **v).count())
            .sum()
    }

    /// Ids of the columns that are True on `row`, in column order.
    pub fn true_columns(&self, row: usize) -> Vec<&str> {
        self.iter_columns()
            .filter(|(_, col)| col[row])
            .map(|(id, _)| id)
            .collect()
    }

    /// 1.0 for True, 0.0 for False.
    pub fn to_float(&self) -> FloatMatrix {
        self.map(|v| if *v { 1.0 } else { 0.0 })
    }
}
