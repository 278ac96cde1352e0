//! Notification log records as returned by the email-records endpoint.
//!
//! One record describes one recipient of one send attempt. Every field is
//! optional on the wire so a malformed row decodes fine and is dropped later
//! by the grouping pass instead of failing the whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Division shown when a record carries none.
pub const UNKNOWN_DIVISION: &str = "Unknown";

/// Delivery outcome of a single send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    /// Ordered above `Sent` so the worst status of a group is its max.
    Failed,
}

impl DeliveryStatus {
    /// Case-insensitive. Anything other than "failed" counts as sent,
    /// including a missing status.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("failed") => DeliveryStatus::Failed,
            _ => DeliveryStatus::Sent,
        }
    }

    /// Combine two statuses: a failure anywhere taints the result.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = crate::error::BuddyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(crate::error::BuddyError::Validation(format!(
                "Unknown delivery status '{}': expected sent or failed",
                other
            ))),
        }
    }
}

/// A single recipient-send event from the notification log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(default, alias = "_id", alias = "id")]
    pub record_id: Option<String>,

    #[serde(default)]
    pub query_id: Option<String>,

    #[serde(default, alias = "department")]
    pub department_name: Option<String>,

    #[serde(default)]
    pub division: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub query_type: Option<String>,

    #[serde(default, alias = "email")]
    pub recipient_email: Option<String>,

    /// RFC 3339. Unparseable or non-string timestamps decode as `None`.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub sent_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: Option<String>,
}

impl NotificationRecord {
    pub fn new(record_id: &str, query_id: &str, department_name: &str, recipient_email: &str) -> Self {
        Self {
            record_id: Some(record_id.to_string()),
            query_id: Some(query_id.to_string()),
            department_name: Some(department_name.to_string()),
            recipient_email: Some(recipient_email.to_string()),
            ..Default::default()
        }
    }

    pub fn with_sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_division(mut self, division: &str) -> Self {
        self.division = Some(division.to_string());
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn with_query_type(mut self, query_type: &str) -> Self {
        self.query_type = Some(query_type.to_string());
        self
    }

    /// Division, or [`UNKNOWN_DIVISION`] when absent or blank.
    pub fn division_or_unknown(&self) -> &str {
        non_blank(self.division.as_deref()).unwrap_or(UNKNOWN_DIVISION)
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        DeliveryStatus::normalize(self.status.as_deref())
    }
}

/// `Some` only when the value has non-whitespace content.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts any JSON value; only an RFC 3339 string becomes a timestamp.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!("Ignoring unparseable timestamp '{}': {}", s, e);
                None
            }
        },
        Some(other) => {
            tracing::debug!("Ignoring non-string timestamp {}", other);
            None
        }
    })
}
