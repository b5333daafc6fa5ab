//! Recording job: a program on a specific station.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::program::{Program, RADIKO_TIMESTAMP_FORMAT};
use crate::{Error, Result};

/// A unit of recording work.
///
/// Jobs order by `(end, start)` ascending so that programs which finished
/// first are recorded first. Remaining fields only break ties to keep the
/// ordering consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    pub program: Program,
    pub station_id: String,
}

impl Job {
    pub fn new(program: Program, station_id: impl Into<String>) -> Self {
        Self {
            program,
            station_id: station_id.into(),
        }
    }

    /// radiko timefree URL identifying this job.
    pub fn url(&self) -> String {
        format!(
            "https://radiko.jp/#!/ts/{}/{}",
            self.station_id,
            self.program.start_jst().format(RADIKO_TIMESTAMP_FORMAT)
        )
    }

    /// Whether the program has finished airing and can be captured.
    pub fn is_ready_to_process(&self) -> bool {
        self.is_ready_at(Utc::now())
    }

    pub fn is_ready_at(&self, now: DateTime<Utc>) -> bool {
        self.program.end < now
    }

    /// Structural checks applied to submissions.
    pub fn validate(&self) -> Result<()> {
        if self.station_id.trim().is_empty() {
            return Err(Error::validation("station_id must not be empty"));
        }
        if self.program.id.trim().is_empty() {
            return Err(Error::validation("program.id must not be empty"));
        }
        if self.program.end < self.program.start {
            return Err(Error::validation(format!(
                "program ends ({}) before it starts ({})",
                self.program.end, self.program.start
            )));
        }
        Ok(())
    }
}

impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.program, &other.program);
        a.end
            .cmp(&b.end)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| self.station_id.cmp(&other.station_id))
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.duration_secs.cmp(&b.duration_secs))
            .then_with(|| a.performer.cmp(&b.performer))
    }
}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({})",
            self.station_id,
            self.program.title,
            self.program.start_jst().format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::program::parse_radiko_timestamp;
    use chrono::TimeZone;

    fn job(id: &str, ft: &str, to: &str) -> Job {
        Job::new(
            Program {
                id: id.to_string(),
                start: parse_radiko_timestamp(ft).unwrap(),
                end: parse_radiko_timestamp(to).unwrap(),
                duration_secs: 3600,
                title: "Title".to_string(),
                performer: None,
            },
            "TBS",
        )
    }

    #[test]
    fn test_orders_by_end_first() {
        let late = job("a", "20240101000000", "20240101020000");
        let early = job("b", "20240101010000", "20240101013000");
        assert!(early < late);
    }

    #[test]
    fn test_end_tie_broken_by_start() {
        let later_start = job("a", "20240101010000", "20240101020000");
        let earlier_start = job("b", "20240101000000", "20240101020000");
        assert!(earlier_start < later_start);
    }

    #[test]
    fn test_ordering_consistent_with_equality() {
        let a = job("a", "20240101000000", "20240101010000");
        let b = job("b", "20240101000000", "20240101010000");
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_url_uses_japan_time() {
        let mut j = job("a", "20240101050000", "20240101060000");
        assert_eq!(j.url(), "https://radiko.jp/#!/ts/TBS/20240101050000");

        // Same instant submitted in UTC still maps to the Japan-time URL.
        j.program.start = j.program.start.with_timezone(&Utc).fixed_offset();
        assert_eq!(j.url(), "https://radiko.jp/#!/ts/TBS/20240101050000");
    }

    #[test]
    fn test_readiness() {
        let j = job("a", "20240101000000", "20240101010000");
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 15, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2023, 12, 31, 16, 0, 1).unwrap();
        assert!(!j.is_ready_at(before));
        assert!(j.is_ready_at(after));
        assert!(j.is_ready_to_process());
    }

    #[test]
    fn test_validate() {
        assert!(job("a", "20240101000000", "20240101010000").validate().is_ok());
        assert!(job("", "20240101000000", "20240101010000").validate().is_err());
        assert!(job("a", "20240101010000", "20240101000000").validate().is_err());

        let mut no_station = job("a", "20240101000000", "20240101010000");
        no_station.station_id = " ".to_string();
        assert!(no_station.validate().is_err());
    }
}
