//! CSV export of sweep results.
//!
//! Files land in `<output_dir>/<prefix>_<YYYYmmdd_HHMMSS>.csv`. Optional
//! metrics the simulator did not report are written as empty cells.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::executor::RunMetrics;
use crate::sweep::{CapacityRow, InstrumentRow};

pub const CAPACITY_PREFIX: &str = "max_stock_test";
pub const INSTRUMENT_PREFIX: &str = "single_stock_test";

const METRIC_COLUMNS: [&str; 15] = [
    "annual_return",
    "max_drawdown",
    "sharpe_ratio",
    "sortino_ratio",
    "calmar_ratio",
    "volatility",
    "profit_factor",
    "win_rate",
    "total_trades",
    "expectancy",
    "mae",
    "mfe",
    "avg_drawdown",
    "avg_drawdown_days",
    "alpha",
];

fn metric_cells(m: &RunMetrics) -> Vec<String> {
    let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    vec![
        format!("{:.6}", m.annual_return),
        format!("{:.6}", m.max_drawdown),
        opt(m.sharpe_ratio),
        opt(m.sortino_ratio),
        opt(m.calmar_ratio),
        opt(m.volatility),
        opt(m.profit_factor),
        opt(m.win_rate),
        m.total_trades.to_string(),
        opt(m.expectancy),
        opt(m.mae),
        opt(m.mfe),
        opt(m.avg_drawdown),
        opt(m.avg_drawdown_days),
        opt(m.alpha),
        opt(m.beta),
    ]
}

/// Columns: max_stocks, position_limit_pct, then the metric columns and beta.
pub fn write_capacity_csv<W: Write>(writer: W, rows: &[CapacityRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["max_stocks", "position_limit_pct"];
    header.extend(METRIC_COLUMNS);
    header.push("beta");
    wtr.write_record(&header)?;

    for r in rows {
        let mut record = vec![r.max_stocks.to_string(), format!("{:.2}", r.position_limit_pct)];
        record.extend(metric_cells(&r.metrics));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Columns: instrument, total_days, holding_days, then the metric columns and
/// beta.
pub fn write_instrument_csv<W: Write>(writer: W, rows: &[InstrumentRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["instrument", "total_days", "holding_days"];
    header.extend(METRIC_COLUMNS);
    header.push("beta");
    wtr.write_record(&header)?;

    for r in rows {
        let mut record = vec![
            r.instrument.clone(),
            r.total_days.to_string(),
            r.holding_days.to_string(),
        ];
        record.extend(metric_cells(&r.metrics));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `<dir>/<prefix>_<timestamp>.csv`
pub fn timestamped_path(dir: &Path, prefix: &str, at: NaiveDateTime) -> PathBuf {
    dir.join(format!("{prefix}_{}.csv", at.format("%Y%m%d_%H%M%S")))
}

fn create(dir: &Path, prefix: &str) -> Result<(PathBuf, std::fs::File)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = timestamped_path(dir, prefix, chrono::Local::now().naive_local());
    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok((path, file))
}

pub fn export_capacity(dir: &Path, rows: &[CapacityRow]) -> Result<PathBuf> {
    let (path, file) = create(dir, CAPACITY_PREFIX)?;
    write_capacity_csv(file, rows).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("capacity sweep results written to {}", path.display());
    Ok(path)
}

pub fn export_instruments(dir: &Path, rows: &[InstrumentRow]) -> Result<PathBuf> {
    let (path, file) = create(dir, INSTRUMENT_PREFIX)?;
    write_instrument_csv(file, rows)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("instrument sweep results written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn capacity_csv_has_header_and_empty_optionals() {
        let rows = vec![CapacityRow {
            max_stocks: 4,
            position_limit_pct: 25.0,
            metrics: RunMetrics {
                annual_return: 0.1,
                max_drawdown: -0.2,
                total_trades: 7,
                ..RunMetrics::default()
            },
        }];
        let mut buf = Vec::new();
        write_capacity_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("max_stocks,position_limit_pct,annual_return,max_drawdown"));
        assert!(header.ends_with(",alpha,beta"));
        assert_eq!(
            lines.next().unwrap(),
            "4,25.00,0.100000,-0.200000,,,,,,,7,,,,,,,"
        );
    }

    #[test]
    fn instrument_csv_rows() {
        let rows = vec![InstrumentRow {
            instrument: "2330".into(),
            total_days: 100,
            holding_days: 12,
            metrics: RunMetrics {
                sharpe_ratio: Some(1.5),
                ..RunMetrics::default()
            },
        }];
        let mut buf = Vec::new();
        write_instrument_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("2330,100,12,0.000000,0.000000,1.500000,"));
        assert_eq!(row.split(',').count(), 3 + 16);
    }

    #[test]
    fn path_carries_prefix_and_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();
        let path = timestamped_path(Path::new("out"), CAPACITY_PREFIX, at);
        assert_eq!(path, Path::new("out/max_stock_test_20240306_140509.csv"));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_instruments(&dir.path().join("nested"), &[]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("instrument,total_days,holding_days,"));
    }
}
