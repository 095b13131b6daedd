//! Recommendation storage boundary.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::align::PeriodAlignment;
use super::record::RawRecommendation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decode {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of stored recommendation records for one cadence.
pub trait RecommendationStore {
    fn load(&self, frequency: PeriodAlignment) -> Result<Vec<RawRecommendation>, StoreError>;
}

/// `<dir>/weekly.json` and `<dir>/monthly.json`, each a JSON array of records.
/// A missing file means no recommendations yet.
#[derive(Debug, Clone)]
pub struct JsonRecommendationStore {
    dir: PathBuf,
}

impl JsonRecommendationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, frequency: PeriodAlignment) -> PathBuf {
        self.dir.join(format!("{}.json", frequency.as_str()))
    }
}

impl RecommendationStore for JsonRecommendationStore {
    fn load(&self, frequency: PeriodAlignment) -> Result<Vec<RawRecommendation>, StoreError> {
        let path = self.path_for(frequency);
        if !path.exists() {
            log::warn!("{} not found, no {frequency} recommendations", path.display());
            return Ok(Vec::new());
        }
        read_records(&path)
    }
}

/// The file must be a JSON array. Elements that do not decode as a record are
/// skipped with a warning; the rest still load.
fn read_records(path: &Path) -> Result<Vec<RawRecommendation>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let elements: Vec<serde_json::Value> =
        serde_json::from_str(&content).map_err(|e| StoreError::Json {
            path: path.display().to_string(),
            source: e,
        })?;

    let total = elements.len();
    let records: Vec<RawRecommendation> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(i, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("{}: skipping record #{i}: {e}", path.display());
                None
            }
        })
        .collect();
    log::info!(
        "loaded {} of {total} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecommendationStore::new(dir.path());
        assert!(store.load(PeriodAlignment::Weekly).unwrap().is_empty());
    }

    #[test]
    fn reads_frequency_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("monthly.json"),
            r#"[{"date": "2024-03-06", "stocks": [{"id": "2330", "priority": 1}]}]"#,
        )
        .unwrap();
        let store = JsonRecommendationStore::new(dir.path());
        let records = store.load(PeriodAlignment::Monthly).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date.as_deref(), Some("2024-03-06"));
        assert!(store.load(PeriodAlignment::Weekly).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weekly.json"), "{not json").unwrap();
        let err = JsonRecommendationStore::new(dir.path())
            .load(PeriodAlignment::Weekly)
            .unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[test]
    fn bad_record_does_not_hide_its_neighbours() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("weekly.json"),
            r#"[
                {"date": 20240304, "stocks": [{"id": "1101", "priority": 1}]},
                {"date": "2024-03-06", "stocks": [{"id": "2330", "priority": 1}]},
                {"date": "2024-03-13", "stocks": [{"id": 2317.5}]},
                {"date": "2024-03-20", "stocks": [{"id": "2454", "priority": "1"}]}
            ]"#,
        )
        .unwrap();

        let records = JsonRecommendationStore::new(dir.path())
            .load(PeriodAlignment::Weekly)
            .unwrap();
        let dates: Vec<&str> = records.iter().filter_map(|r| r.date.as_deref()).collect();
        assert_eq!(dates, vec!["2024-03-06", "2024-03-20"]);
        assert_eq!(records[1].stocks.as_ref().unwrap()[0].priority, Some(1.0));
    }

    #[test]
    fn non_array_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weekly.json"), r#"{"date": "2024-03-06"}"#).unwrap();
        let err = JsonRecommendationStore::new(dir.path())
            .load(PeriodAlignment::Weekly)
            .unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
