//! Period alignment of recommendation dates.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recommendation cadence. Also names the stored task (`weekly`, `monthly`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodAlignment {
    Weekly,
    Monthly,
}

impl PeriodAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodAlignment::Weekly => "weekly",
            PeriodAlignment::Monthly => "monthly",
        }
    }

    /// The period key of `date`.
    ///
    /// Weekly: the next Sunday at or after `date`. Monthly: the last calendar
    /// day of `date`'s month.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            PeriodAlignment::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(u64::from(to_sunday)))
                    .unwrap_or(date)
            }
            PeriodAlignment::Monthly => date
                .with_day(1)
                .and_then(|first| first.checked_add_months(Months::new(1)))
                .and_then(|next| next.pred_opt())
                .unwrap_or(date),
        }
    }
}

impl fmt::Display for PeriodAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(PeriodAlignment::Weekly),
            "monthly" => Ok(PeriodAlignment::Monthly),
            other => Err(format!("unknown frequency '{other}' (expected weekly or monthly)")),
        }
    }
}
