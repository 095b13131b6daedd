//! Sweeps end to end against a deterministic fake simulator.

use chrono::{Days, NaiveDate};

use holdlab_core::data::MarketData;
use holdlab_core::{BacktestRequest, FloatMatrix, HoldlabConfig, IndicatorStrategy, PositionMatrix};
use holdlab_runner::{
    export_capacity, BacktestExecutor, CapacitySweep, CommandExecutor, ExecutionError,
    InstrumentSweep, RunMetrics,
};

const N: usize = 10;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn matrix(cols: Vec<Vec<f64>>) -> FloatMatrix {
    FloatMatrix::new(
        (0..N as u64).map(|i| start() + Days::new(i)).collect(),
        ["S1", "S2", "S3", "S4"].iter().map(|s| s.to_string()).collect(),
        cols,
    )
    .unwrap()
}

/// S1 and S2 are held on rows 3–4, S3 on rows 6–7, S4 never.
fn market() -> MarketData {
    let flat = |v: f64| vec![v; N];
    let spike = |from: usize| {
        let mut v = flat(1.0);
        v[from] = 3.0;
        v[from + 1] = 3.0;
        v
    };
    let all = |v: f64| matrix(vec![flat(v), flat(v), flat(v), flat(v)]);

    MarketData::aligned(
        all(10.0),
        all(9.0),
        matrix(vec![spike(2), spike(2), spike(5), flat(1.0)]),
        all(2.0),
        all(5e6),
        all(1.0),
        all(1.0),
        all(1.0),
    )
    .unwrap()
}

fn strategy() -> IndicatorStrategy {
    let mut config = HoldlabConfig::default();
    config.indicator.sar_max_dots = 10;
    config.indicator.volume_window = 2;
    IndicatorStrategy::new(&config, &market()).unwrap()
}

/// Reports `holding cells × position limit` for weighted runs and
/// `first held row / 10` for single-instrument runs. Fails on one limit.
struct FakeSimulator {
    fail_on_limit: Option<f64>,
}

impl BacktestExecutor for FakeSimulator {
    fn execute(&self, request: &BacktestRequest) -> Result<RunMetrics, ExecutionError> {
        if Some(request.params.position_limit) == self.fail_on_limit {
            return Err(ExecutionError::Failed {
                status: "exit status: 1".into(),
                stderr: "simulated failure".into(),
            });
        }
        let annual_return = match &request.position {
            PositionMatrix::Weights(_) => {
                request.position.holding_cells() as f64 * request.params.position_limit
            }
            PositionMatrix::Signals(m) => {
                let first = (0..m.n_rows()).find(|&r| m.count_row(r) > 0).unwrap_or(0);
                first as f64 / 10.0
            }
        };
        Ok(RunMetrics {
            annual_return,
            total_trades: 1,
            sharpe_ratio: Some(annual_return * 2.0),
            ..RunMetrics::default()
        })
    }
}

#[test]
fn capacity_sweep_isolates_failures_and_sorts() {
    let sweep = CapacitySweep::new(1, 4, start(), 3).unwrap();
    let report = sweep
        .run(&strategy(), &FakeSimulator { fail_on_limit: Some(0.5) })
        .unwrap();

    let ks: Vec<usize> = report.rows.iter().map(|r| r.max_stocks).collect();
    assert_eq!(ks, vec![1, 3, 4]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 2);

    // K=1: 4 cells × 1.0; K=3: 6 cells × 1/3; K=4: 6 cells × 1/4.
    assert_eq!(report.rows[0].metrics.annual_return, 4.0);
    assert!((report.rows[1].metrics.annual_return - 2.0).abs() < 1e-12);
    assert_eq!(report.rows[2].metrics.annual_return, 1.5);
    assert_eq!(report.rows[2].position_limit_pct, 25.0);

    let summary = report.summary();
    assert_eq!(summary.best_return, Some((1, 4.0)));
    assert_eq!(summary.best_sharpe, Some((1, 8.0)));
}

#[test]
fn instrument_sweep_covers_signalled_instruments() {
    let sweep = InstrumentSweep::new(start(), 2);
    let report = sweep
        .run(&strategy(), &FakeSimulator { fail_on_limit: None })
        .unwrap();

    let order: Vec<&str> = report.rows.iter().map(|r| r.instrument.as_str()).collect();
    assert_eq!(order, vec!["S3", "S1", "S2"]);
    assert!(report.failures.is_empty());
    assert!(report
        .rows
        .iter()
        .all(|r| r.total_days == N && r.holding_days == 2));

    let summary = report.summary(2).unwrap();
    assert_eq!(summary.tested, 3);
    assert_eq!(summary.positive_count, 3);
    assert_eq!(summary.top.len(), 2);
}

#[test]
fn instrument_sweep_with_late_start_is_empty() {
    let late = start() + Days::new(9);
    let report = InstrumentSweep::new(late, 2)
        .run(&strategy(), &FakeSimulator { fail_on_limit: None })
        .unwrap();
    assert!(report.rows.is_empty());
    assert!(report.summary(10).is_none());
}

#[test]
fn capacity_results_export_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let report = CapacitySweep::new(1, 2, start(), 2)
        .unwrap()
        .run(&strategy(), &FakeSimulator { fail_on_limit: None })
        .unwrap();

    let path = export_capacity(dir.path(), &report.rows).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("max_stock_test_") && name.ends_with(".csv"));

    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,100.00,"));
    assert!(lines[2].starts_with("2,50.00,"));
}

#[cfg(unix)]
#[test]
fn command_executor_runs_external_simulator() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("sim.sh");
    std::fs::write(
        &script,
        "test -f \"$1\" && test -f \"$2\" || exit 2\n\
         echo '{\"annual_return\": 0.25, \"max_drawdown\": -0.1, \"total_trades\": 3}'\n",
    )
    .unwrap();

    let exec = CommandExecutor::new("sh", dir.path().join("runs"))
        .with_args(vec![script.display().to_string()]);
    let request = strategy().allocate(2, start()).unwrap();
    let metrics = exec.execute(&request).unwrap();
    assert_eq!(metrics.annual_return, 0.25);
    assert_eq!(metrics.total_trades, 3);

    // The run's inputs are gone once the metrics are in.
    let leftover = std::fs::read_dir(dir.path().join("runs")).unwrap().count();
    assert_eq!(leftover, 0);
}

#[cfg(unix)]
#[test]
fn command_executor_keeps_runs_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("sim.sh");
    std::fs::write(
        &script,
        "echo '{\"annual_return\": 0.1, \"max_drawdown\": 0.0}'\n",
    )
    .unwrap();

    let exec = CommandExecutor::new("sh", dir.path().join("runs"))
        .with_args(vec![script.display().to_string()])
        .with_keep_runs(true);
    let request = strategy().allocate(2, start()).unwrap();
    exec.execute(&request).unwrap();
    exec.execute(&request).unwrap();

    let runs: Vec<std::path::PathBuf> = std::fs::read_dir(dir.path().join("runs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(runs.len(), 2);
    for run in &runs {
        assert!(run.join("positions.csv").is_file());
        assert!(run.join("params.json").is_file());
    }
}

#[cfg(unix)]
#[test]
fn command_executor_reports_failed_exit() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fail.sh");
    std::fs::write(&script, "echo oops >&2\nexit 3\n").unwrap();

    let exec = CommandExecutor::new("sh", dir.path().join("runs"))
        .with_args(vec![script.display().to_string()]);
    let request = strategy().allocate(1, start()).unwrap();
    match exec.execute(&request) {
        Err(ExecutionError::Failed { stderr, .. }) => assert_eq!(stderr, "oops"),
        other => panic!("expected failure, got {other:?}"),
    }
    // Failed runs clean up too.
    assert_eq!(std::fs::read_dir(dir.path().join("runs")).unwrap().count(), 0);
}
