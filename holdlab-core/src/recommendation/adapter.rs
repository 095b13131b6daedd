use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashSet};

use super::align::PeriodAlignment;
use super::record::{Candidate, RecommendationRecord};
use crate::allocator::Capacity;
use crate::matrix::{BoolMatrix, MatrixError};

/// The record retained for one aligned period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBatch {
    pub period_end: NaiveDate,
    pub original_date: NaiveDate,
    pub candidates: Vec<Candidate>,
}

/// Turns recommendation records into a daily boolean position matrix.
///
/// Capacity is applied here, at ingestion: each period's candidates are ranked
/// by ascending priority (missing priority last, stored order among ties) and
/// truncated to K. No per-date filtering happens downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationAdapter {
    alignment: PeriodAlignment,
    capacity: Option<Capacity>,
}

impl RecommendationAdapter {
    pub fn new(alignment: PeriodAlignment, capacity: Option<Capacity>) -> Self {
        Self {
            alignment,
            capacity,
        }
    }

    /// One batch per period key. Within a period only a record with a strictly
    /// later original date replaces the current one, so ties keep the record
    /// seen first.
    pub fn fold_batches(&self, records: &[RecommendationRecord]) -> BTreeMap<NaiveDate, PeriodBatch> {
        let mut batches: BTreeMap<NaiveDate, PeriodBatch> = BTreeMap::new();
        for record in records {
            let period_end = self.alignment.period_end(record.date);
            if period_end != record.date {
                log::debug!("{} aligned to {period_end}", record.date);
            }
            match batches.get_mut(&period_end) {
                Some(batch) if record.date > batch.original_date => {
                    log::debug!(
                        "period {period_end}: {} replaces {}",
                        record.date,
                        batch.original_date
                    );
                    batch.original_date = record.date;
                    batch.candidates = record.candidates.clone();
                }
                Some(_) => {}
                None => {
                    batches.insert(
                        period_end,
                        PeriodBatch {
                            period_end,
                            original_date: record.date,
                            candidates: record.candidates.clone(),
                        },
                    );
                }
            }
        }
        batches
    }

    /// Ranked, truncated and de-duplicated instrument ids of one batch.
    pub fn select(&self, batch: &PeriodBatch) -> Vec<String> {
        let mut ranked: Vec<&Candidate> = batch.candidates.iter().collect();
        // Stable sort: equal priorities keep their stored order.
        ranked.sort_by(|a, b| {
            let pa = a.priority.unwrap_or(f64::INFINITY);
            let pb = b.priority.unwrap_or(f64::INFINITY);
            pa.total_cmp(&pb)
        });
        if let Some(k) = self.capacity {
            ranked.truncate(k.get());
        }

        let mut seen = HashSet::new();
        ranked
            .into_iter()
            .filter(|c| seen.insert(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Daily position matrix over `universe`.
    ///
    /// Rows run daily (calendar days) from the first period end through the
    /// later of the last period end and the last `calendar` date, each day
    /// carrying the most recent period's selection. Instruments outside
    /// `universe` are dropped, universe members never recommended stay false.
    /// Returns `None` when no period selects anything.
    pub fn build(
        &self,
        records: &[RecommendationRecord],
        calendar: &[NaiveDate],
        universe: &[String],
    ) -> Result<Option<BoolMatrix>, MatrixError> {
        let periods: Vec<(NaiveDate, Vec<String>)> = self
            .fold_batches(records)
            .into_values()
            .map(|batch| (batch.period_end, self.select(&batch)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();

        let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
            log::warn!("no {} recommendations survived parsing", self.alignment);
            return Ok(None);
        };
        let (start, last_period) = (first.0, last.0);

        let mut ids: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for id in periods.iter().flat_map(|(_, ids)| ids) {
            if seen.insert(id.as_str()) {
                ids.push(id.clone());
            }
        }

        let sparse = BoolMatrix::from_fn(
            periods.iter().map(|(date, _)| *date).collect(),
            ids.clone(),
            |row, col| periods[row].1.contains(&ids[col]),
        )?;

        let end = calendar
            .last()
            .copied()
            .map_or(last_period, |d| d.max(last_period));
        let daily = calendar_days(start, end);

        let outside = ids.iter().filter(|id| !universe.contains(id)).count();
        if outside > 0 {
            log::debug!("{outside} recommended instruments are outside the universe");
        }

        let position = sparse.reindex_ffill(&daily, universe, false)?;
        log::info!(
            "{} recommendations: {} periods, {} to {}, {} instruments",
            self.alignment,
            periods.len(),
            start,
            end,
            ids.len() - outside
        );
        Ok(Some(position))
    }
}

fn calendar_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1)))
        .take_while(|d| *d <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn cand(id: &str, priority: Option<f64>) -> Candidate {
        Candidate {
            id: id.to_string(),
            priority,
        }
    }

    fn record(date: NaiveDate, ids: &[&str]) -> RecommendationRecord {
        RecommendationRecord {
            date,
            candidates: ids
                .iter()
                .enumerate()
                .map(|(i, id)| cand(id, Some(i as f64)))
                .collect(),
        }
    }

    fn weekly(k: Option<usize>) -> RecommendationAdapter {
        RecommendationAdapter::new(
            PeriodAlignment::Weekly,
            k.map(|k| Capacity::new(k).unwrap()),
        )
    }

    fn universe(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn later_record_wins_regardless_of_order() {
        // Monday and Wednesday of the week ending Sunday 2024-03-10.
        let monday = record(d(3, 4), &["A"]);
        let wednesday = record(d(3, 6), &["B"]);

        for records in [
            vec![monday.clone(), wednesday.clone()],
            vec![wednesday.clone(), monday.clone()],
        ] {
            let batches = weekly(None).fold_batches(&records);
            assert_eq!(batches.len(), 1);
            let batch = &batches[&d(3, 10)];
            assert_eq!(batch.original_date, d(3, 6));
            assert_eq!(batch.candidates[0].id, "B");
        }
    }

    #[test]
    fn same_date_keeps_first_record() {
        let records = vec![record(d(3, 6), &["A"]), record(d(3, 6), &["B"])];
        let batches = weekly(None).fold_batches(&records);
        assert_eq!(batches[&d(3, 10)].candidates[0].id, "A");
    }

    #[test]
    fn select_ranks_by_priority_missing_last() {
        let batch = PeriodBatch {
            period_end: d(3, 10),
            original_date: d(3, 6),
            candidates: vec![
                cand("none", None),
                cand("third", Some(3.0)),
                cand("first", Some(1.0)),
                cand("second", Some(2.0)),
                cand("first", Some(1.5)),
            ],
        };
        // Truncation happens before the duplicate "first" is collapsed.
        assert_eq!(weekly(Some(3)).select(&batch), vec!["first", "second"]);
        assert_eq!(
            weekly(None).select(&batch),
            vec!["first", "second", "third", "none"]
        );
    }

    #[test]
    fn build_ffills_to_latest_market_date() {
        let records = vec![record(d(3, 4), &["A"]), record(d(3, 13), &["B"])];
        let calendar = vec![d(3, 18), d(3, 19)];
        let position = weekly(None)
            .build(&records, &calendar, &universe(&["A", "B", "C"]))
            .unwrap()
            .unwrap();

        // 2024-03-10 (first Sunday) through 2024-03-19.
        assert_eq!(position.n_rows(), 10);
        assert_eq!(position.index()[0], d(3, 10));
        let a = position.column_by_id("A").unwrap();
        let b = position.column_by_id("B").unwrap();
        assert!(a[..7].iter().all(|v| *v));
        assert!(a[7..].iter().all(|v| !*v));
        assert!(b[..7].iter().all(|v| !*v));
        assert!(b[7..].iter().all(|v| *v));
        assert!(position.column_by_id("C").unwrap().iter().all(|v| !*v));
    }

    #[test]
    fn build_drops_instruments_outside_universe() {
        let records = vec![record(d(3, 4), &["A", "Z"])];
        let position = weekly(None)
            .build(&records, &[], &universe(&["A"]))
            .unwrap()
            .unwrap();
        assert_eq!(position.columns(), &["A".to_string()]);
        assert_eq!(position.n_rows(), 1);
    }

    #[test]
    fn empty_input_is_none() {
        let out = weekly(Some(5)).build(&[], &[d(3, 4)], &universe(&["A"])).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn period_with_no_ids_carries_previous_selection() {
        let empty = RecommendationRecord {
            date: d(3, 13),
            candidates: vec![],
        };
        let records = vec![record(d(3, 4), &["A"]), empty];
        let position = weekly(None)
            .build(&records, &[d(3, 17)], &universe(&["A"]))
            .unwrap()
            .unwrap();
        assert!(position.column(0).iter().all(|v| *v));
    }
}
