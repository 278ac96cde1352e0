//! Calendar month selector used by report filters and exports (`YYYY-MM`).

use crate::error::BuddyError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest month selector `recent` will build (ten years).
pub const MAX_RECENT_MONTHS: usize = 120;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, BuddyError> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(BuddyError::InvalidMonth(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before, or `None` before January of year 1.
    pub fn previous(&self) -> Option<Self> {
        if self.month > 1 {
            Some(Self { year: self.year, month: self.month - 1 })
        } else if self.year > 1 {
            Some(Self { year: self.year - 1, month: 12 })
        } else {
            None
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }

    /// Human label, e.g. "October 2026".
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// The `count` months ending with the month of `today`, newest first.
    /// At most [`MAX_RECENT_MONTHS`], and never earlier than 0001-01.
    pub fn recent(today: NaiveDate, count: usize) -> Vec<Self> {
        let count = count.min(MAX_RECENT_MONTHS);
        let mut months = Vec::with_capacity(count);
        let mut current = Some(Self::containing(today));
        while let Some(month) = current {
            if months.len() == count {
                break;
            }
            months.push(month);
            current = month.previous();
        }
        months
    }

    /// File name the email-records export is saved under.
    pub fn email_export_file_name(&self) -> String {
        format!("email_records_{:04}_{:02}.xlsx", self.year, self.month)
    }

    /// File name the volunteer-applications export is saved under.
    pub fn volunteer_export_file_name(&self) -> String {
        format!("TrafficBuddy_VolunteerApplications_{}.xlsx", self)
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = BuddyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BuddyError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ReportMonth {
    type Error = BuddyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportMonth> for String {
    fn from(month: ReportMonth) -> Self {
        month.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_and_display() {
        let m: ReportMonth = "2024-03".parse().unwrap();
        assert_eq!(m.year(), 2024);
        assert_eq!(m.month(), 3);
        assert_eq!(m.to_string(), "2024-03");

        let m: ReportMonth = "2024-3".parse().unwrap();
        assert_eq!(m.to_string(), "2024-03");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["2024", "2024-13", "2024-00", "24-01", "2024-abc", "", "2024-011"] {
            assert!(bad.parse::<ReportMonth>().is_err(), "{} should fail", bad);
        }
    }

    #[test]
    fn test_label() {
        let m = ReportMonth::new(2026, 10).unwrap();
        assert_eq!(m.label(), "October 2026");
    }

    #[test]
    fn test_recent_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let months: Vec<String> = ReportMonth::recent(today, 4).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2025-02", "2025-01", "2024-12", "2024-11"]);
    }

    #[test]
    fn test_recent_is_capped() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let months = ReportMonth::recent(today, usize::MAX);
        assert_eq!(months.len(), MAX_RECENT_MONTHS);
        assert_eq!(months[0].to_string(), "2026-10");
        assert_eq!(months[MAX_RECENT_MONTHS - 1].to_string(), "2016-11");
        assert!(ReportMonth::recent(today, 0).is_empty());
    }

    #[test]
    fn test_recent_stops_at_year_one() {
        let today = NaiveDate::from_ymd_opt(1, 2, 10).unwrap();
        let months: Vec<String> = ReportMonth::recent(today, 12).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["0001-02", "0001-01"]);
        assert_eq!(ReportMonth::new(1, 1).unwrap().previous(), None);
        assert_eq!(
            ReportMonth::new(2024, 1).unwrap().previous(),
            Some(ReportMonth::new(2023, 12).unwrap())
        );
    }

    #[test]
    fn test_contains() {
        let m = ReportMonth::new(2024, 1).unwrap();
        assert!(m.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!m.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_export_file_names() {
        let m = ReportMonth::new(2024, 5).unwrap();
        assert_eq!(m.email_export_file_name(), "email_records_2024_05.xlsx");
        assert_eq!(
            m.volunteer_export_file_name(),
            "TrafficBuddy_VolunteerApplications_2024-05.xlsx"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let m = ReportMonth::new(2024, 5).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2024-05\"");
        let back: ReportMonth = serde_json::from_str("\"2024-05\"").unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<ReportMonth>("\"2024-99\"").is_err());
    }
}
