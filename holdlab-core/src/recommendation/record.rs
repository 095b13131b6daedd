//! Stored recommendation records and their validated form.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Instrument code as stored: some producers write `"2330"`, others `2330`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstrumentCode {
    Text(String),
    Number(i64),
}

impl InstrumentCode {
    fn to_id(&self) -> Option<String> {
        match self {
            InstrumentCode::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            InstrumentCode::Number(n) => Some(n.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub id: Option<InstrumentCode>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Numbers and numeric strings are priorities; anything else counts as
/// missing and ranks last.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// One record exactly as the recommendation store holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecommendation {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub stocks: Option<Vec<RawCandidate>>,
}

/// A ranked candidate. Lower priority values rank first.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub priority: Option<f64>,
}

/// A validated record: a date and its candidates in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRecord {
    pub date: NaiveDate,
    pub candidates: Vec<Candidate>,
}

impl RawRecommendation {
    /// `None` when the date is missing or unreadable, or the stock list is
    /// empty. Candidates without an id are dropped; a record whose candidates
    /// all lack ids still takes part in per-period deduplication.
    pub fn parse(&self) -> Option<RecommendationRecord> {
        let date = parse_date(self.date.as_deref()?)?;
        let stocks = self.stocks.as_ref().filter(|s| !s.is_empty())?;
        let candidates = stocks
            .iter()
            .filter_map(|c| {
                let id = c.id.as_ref().and_then(InstrumentCode::to_id);
                if id.is_none() {
                    log::debug!("{date}: dropping candidate without id ({:?})", c.name);
                }
                Some(Candidate {
                    id: id?,
                    priority: c.priority,
                })
            })
            .collect();
        Some(RecommendationRecord { date, candidates })
    }
}

/// Parse every record, skipping (and logging) the unusable ones.
pub fn parse_records(raw: &[RawRecommendation]) -> Vec<RecommendationRecord> {
    let parsed: Vec<RecommendationRecord> = raw
        .iter()
        .filter_map(|r| {
            let record = r.parse();
            if record.is_none() {
                log::warn!("skipping recommendation record dated {:?}", r.date);
            }
            record
        })
        .collect();
    log::info!("parsed {} of {} recommendation records", parsed.len(), raw.len());
    parsed
}

/// Accepts `YYYY-MM-DD` and ISO-style timestamps; the time part is ignored.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
}
