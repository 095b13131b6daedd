//! Market data consumed by the signal composer, and the provider trait.

use std::path::PathBuf;

use super::wide_csv::read_float_matrix_file;
use super::DataError;
use crate::matrix::FloatMatrix;

/// Every input series of the indicator-driven strategy, on one shared axis.
#[derive(Debug, Clone)]
pub struct MarketData {
    /// Adjusted close. Its index and columns define the universe.
    pub adj_close: FloatMatrix,
    /// Trend-reversal (SAR-type) level.
    pub sar: FloatMatrix,
    /// Fast oscillator line (MACD DIF).
    pub macd_dif: FloatMatrix,
    /// Slow oscillator line (MACD signal).
    pub macd_dea: FloatMatrix,
    pub volume: FloatMatrix,
    pub foreign_net: FloatMatrix,
    pub trust_net: FloatMatrix,
    pub dealer_net: FloatMatrix,
}

impl MarketData {
    /// Reindex every series onto the `adj_close` axes. Cells absent from a
    /// series become NaN.
    #[allow(clippy::too_many_arguments)]
    pub fn aligned(
        adj_close: FloatMatrix,
        sar: FloatMatrix,
        macd_dif: FloatMatrix,
        macd_dea: FloatMatrix,
        volume: FloatMatrix,
        foreign_net: FloatMatrix,
        trust_net: FloatMatrix,
        dealer_net: FloatMatrix,
    ) -> Result<Self, DataError> {
        let index = adj_close.index().to_vec();
        let columns = adj_close.columns().to_vec();
        let align = |m: FloatMatrix| -> Result<FloatMatrix, DataError> {
            if m.same_axes(&adj_close) {
                return Ok(m);
            }
            m.reindex(&index, &columns, f64::NAN)
                .map_err(|e| DataError::Validation(e.to_string()))
        };

        Ok(Self {
            sar: align(sar)?,
            macd_dif: align(macd_dif)?,
            macd_dea: align(macd_dea)?,
            volume: align(volume)?,
            foreign_net: align(foreign_net)?,
            trust_net: align(trust_net)?,
            dealer_net: align(dealer_net)?,
            adj_close,
        })
    }

    /// Instrument ids of the universe.
    pub fn universe(&self) -> &[String] {
        self.adj_close.columns()
    }
}

/// Source of `MarketData` (file import, database, vendor API, fixtures).
pub trait MarketDataProvider {
    fn load(&self) -> Result<MarketData, DataError>;
}

/// The input series, named by their on-disk file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesName {
    AdjClose,
    Sar,
    MacdDif,
    MacdDea,
    Volume,
    ForeignNet,
    TrustNet,
    DealerNet,
}

impl SeriesName {
    pub const ALL: [SeriesName; 8] = [
        SeriesName::AdjClose,
        SeriesName::Sar,
        SeriesName::MacdDif,
        SeriesName::MacdDea,
        SeriesName::Volume,
        SeriesName::ForeignNet,
        SeriesName::TrustNet,
        SeriesName::DealerNet,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            SeriesName::AdjClose => "adj_close",
            SeriesName::Sar => "sar",
            SeriesName::MacdDif => "macd_dif",
            SeriesName::MacdDea => "macd_dea",
            SeriesName::Volume => "volume",
            SeriesName::ForeignNet => "foreign_net_buy",
            SeriesName::TrustNet => "trust_net_buy",
            SeriesName::DealerNet => "dealer_net_buy",
        }
    }
}

/// Directory of wide CSV files, one per series (`adj_close.csv`, `sar.csv`, ...).
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, series: SeriesName) -> Result<FloatMatrix, DataError> {
        let path = self.dir.join(format!("{}.csv", series.file_stem()));
        if !path.exists() {
            return Err(DataError::MissingSeries(path.display().to_string()));
        }
        read_float_matrix_file(&path)
    }
}

impl MarketDataProvider for CsvMarketData {
    fn load(&self) -> Result<MarketData, DataError> {
        let data = MarketData::aligned(
            self.read(SeriesName::AdjClose)?,
            self.read(SeriesName::Sar)?,
            self.read(SeriesName::MacdDif)?,
            self.read(SeriesName::MacdDea)?,
            self.read(SeriesName::Volume)?,
            self.read(SeriesName::ForeignNet)?,
            self.read(SeriesName::TrustNet)?,
            self.read(SeriesName::DealerNet)?,
        )?;
        log::info!(
            "loaded market data from {}: {} dates x {} instruments",
            self.dir.display(),
            data.adj_close.n_rows(),
            data.adj_close.n_cols()
        );
        Ok(data)
    }
}
