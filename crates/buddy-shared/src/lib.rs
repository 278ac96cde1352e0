//! Shared types and transforms for the Traffic Buddy admin dashboard.
//!
//! The centerpiece is [`grouping`]: flat email-notification log rows folded
//! into one summary per (query, department). The other modules cover the
//! remaining client-side work of the dashboard (filters, pagination,
//! resolution and trend charts, volunteer review) so every screen shares one
//! implementation.

pub mod config;
pub mod divisions;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod grouping;
pub mod month;
pub mod pagination;
pub mod records;
pub mod resolution;
pub mod trends;
pub mod volunteers;

pub use config::DashboardConfig;
pub use error::{BuddyError, Result};
pub use filters::{ApplicationQuery, NotificationFilter};
pub use grouping::{
    group_notifications, GroupAccumulator, GroupKey, GroupSource, GroupedBatch,
    GroupedNotificationSummary, RequiredField, SkipReason,
};
pub use month::ReportMonth;
pub use pagination::{page_window, parse_page_input, PageItem, PageSpan};
pub use records::{DeliveryStatus, NotificationRecord, UNKNOWN_DIVISION};
pub use volunteers::{
    ApplicationStats, ApplicationStatus, BroadcastRequest, ReviewDecision, StatusUpdate,
    VolunteerApplication,
};
