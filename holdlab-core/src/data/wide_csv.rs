//! Wide CSV layout shared by data inputs and position outputs.
//!
//! First column `date` (`YYYY-MM-DD`), then one column per instrument id.
//! A blank cell, or one of the usual NA markers, is a missing value. Any other
//! non-numeric cell is an error.

use chrono::NaiveDate;
use std::io::{Read, Write};
use std::path::Path;

use super::DataError;
use crate::matrix::{FloatMatrix, TimeSeriesMatrix};

const DATE_FORMAT: &str = "%Y-%m-%d";

const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "null", "NULL", "#N/A"];

fn parse_cell(raw: &str) -> Option<f64> {
    let cell = raw.trim();
    if cell.is_empty() || MISSING_MARKERS.contains(&cell) {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

/// Parse a wide CSV into a `FloatMatrix`. Rows are sorted by date; missing
/// cells become NaN.
pub fn read_float_matrix<R: Read>(reader: R, source: &str) -> Result<FloatMatrix, DataError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DataError::Csv(format!("{source}: {e}")))?
        .clone();
    if headers.get(0).map(str::trim) != Some("date") {
        return Err(DataError::Validation(format!(
            "{source}: first column must be 'date'"
        )));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DataError::Csv(format!("{source}: {e}")))?;
        let raw_date = record.get(0).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::Validation(format!("{source}: row {}: bad date '{raw_date}': {e}", line + 1))
        })?;
        let values = record
            .iter()
            .skip(1)
            .zip(&columns)
            .map(|(cell, column)| {
                parse_cell(cell).ok_or_else(|| {
                    DataError::Validation(format!(
                        "{source}: row {} ({raw_date}), column '{column}': not a number '{}'",
                        line + 1,
                        cell.trim()
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push((date, values));
    }
    rows.sort_by_key(|(d, _)| *d);

    let index: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
    let values: Vec<Vec<f64>> = (0..columns.len())
        .map(|c| rows.iter().map(|(_, v)| v[c]).collect())
        .collect();

    TimeSeriesMatrix::new(index, columns, values)
        .map_err(|e| DataError::Validation(format!("{source}: {e}")))
}

/// Read a wide CSV file.
pub fn read_float_matrix_file(path: &Path) -> Result<FloatMatrix, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_float_matrix(file, &path.display().to_string())
}

/// Write any matrix as a wide CSV, formatting cells with `cell`.
pub fn write_matrix<T, W: Write>(
    writer: W,
    matrix: &TimeSeriesMatrix<T>,
    cell: impl Fn(&T) -> String,
) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(matrix.n_cols() + 1);
    header.push("date".to_string());
    header.extend(matrix.columns().iter().cloned());
    wtr.write_record(&header)
        .map_err(|e| DataError::Csv(e.to_string()))?;

    for (r, date) in matrix.index().iter().enumerate() {
        let mut record = Vec::with_capacity(matrix.n_cols() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        record.extend((0..matrix.n_cols()).map(|c| cell(&matrix.column(c)[r])));
        wtr.write_record(&record)
            .map_err(|e| DataError::Csv(e.to_string()))?;
    }

    wtr.flush().map_err(|e| DataError::Csv(e.to_string()))
}
