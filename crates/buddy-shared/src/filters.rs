//! Report filters.
//!
//! Predicates are meant for the query boundary: [`to_query_pairs`] renders
//! them as backend query parameters, and [`matches`] evaluates the same
//! predicates locally on a fetched batch. Either way they run before
//! grouping and pagination so page counts stay honest.
//!
//! [`to_query_pairs`]: NotificationFilter::to_query_pairs
//! [`matches`]: NotificationFilter::matches

use crate::divisions::same_division;
use crate::error::BuddyError;
use crate::month::ReportMonth;
use crate::records::{non_blank, DeliveryStatus, NotificationRecord};
use crate::volunteers::{ApplicationStatus, VolunteerApplication};

/// Default page size of the volunteer list.
pub const APPLICATIONS_PAGE_SIZE: u32 = 15;

fn clean(value: Option<&str>) -> Option<String> {
    non_blank(value).map(|v| v.trim().to_string())
}

fn month_pairs(month: Option<ReportMonth>, pairs: &mut Vec<(&'static str, String)>) {
    if let Some(month) = month {
        pairs.push(("year", month.year().to_string()));
        pairs.push(("month", month.month().to_string()));
    }
}

// ============================================================================
// Email records
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub division: Option<String>,
    pub month: Option<ReportMonth>,
    pub status: Option<DeliveryStatus>,
}

impl NotificationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank divisions mean "all divisions".
    pub fn with_division(mut self, division: Option<&str>) -> Self {
        self.division = clean(division);
        self
    }

    pub fn with_month(mut self, month: Option<ReportMonth>) -> Self {
        self.month = month;
        self
    }

    pub fn with_status(mut self, status: Option<DeliveryStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.division.is_none() && self.month.is_none() && self.status.is_none()
    }

    /// Query parameters for the email-records endpoint, set predicates only.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(division) = &self.division {
            pairs.push(("division", division.clone()));
        }
        month_pairs(self.month, &mut pairs);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }

    /// A month predicate excludes records without a send time.
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        if let Some(division) = &self.division {
            if !same_division(division, record.division_or_unknown()) {
                return false;
            }
        }
        if let Some(month) = self.month {
            if !record.sent_at.is_some_and(|ts| month.contains(ts)) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.delivery_status() != status {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

// ============================================================================
// Volunteer applications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<ApplicationStatus>,
    pub month: Option<ReportMonth>,
    pub division: Option<String>,
    pub search: Option<String>,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: APPLICATIONS_PAGE_SIZE,
            status: None,
            month: None,
            division: None,
            search: None,
        }
    }
}

impl ApplicationQuery {
    /// Parse a status tab name; "all" or blank means no status filter.
    pub fn parse_status_tab(tab: &str) -> Result<Option<ApplicationStatus>, BuddyError> {
        let tab = tab.trim();
        if tab.is_empty() || tab.eq_ignore_ascii_case("all") {
            Ok(None)
        } else {
            tab.parse().map(Some)
        }
    }

    pub fn with_division(mut self, division: Option<&str>) -> Self {
        self.division = clean(division);
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = clean(search);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_ascii_lowercase()));
        }
        month_pairs(self.month, &mut pairs);
        if let Some(division) = &self.division {
            pairs.push(("division", division.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }

    pub fn matches(&self, app: &VolunteerApplication) -> bool {
        if self.status.is_some_and(|s| s != app.status) {
            return false;
        }
        if let Some(month) = self.month {
            if !app.applied_at.is_some_and(|ts| month.contains(ts)) {
                return false;
            }
        }
        if let Some(division) = &self.division {
            let app_division = non_blank(app.division.as_deref()).unwrap_or("");
            if !same_division(division, app_division) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [&app.full_name, &app.user_name, &app.email, &app.phone]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}
