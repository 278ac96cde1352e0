//! Volunteer join-request review.
//!
//! Applications arrive Pending and are approved or rejected by a named
//! verifier. An approved volunteer can still be rejected later; a rejection
//! is final.

use crate::divisions;
use crate::error::BuddyError;
use crate::records::{lenient_timestamp, non_blank};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Rejected)
        )
    }

    pub fn transition(self, next: ApplicationStatus) -> Result<ApplicationStatus, BuddyError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BuddyError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = BuddyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(BuddyError::Validation(format!(
                "Unknown application status '{}': expected pending, approved or rejected",
                s
            ))),
        }
    }
}

/// A volunteer join request. Identity documents are never decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolunteerApplication {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// WhatsApp display name.
    #[serde(default)]
    pub user_name: Option<String>,
    /// WhatsApp id, e.g. "whatsapp:+91...".
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verification_notes: Option<String>,
}

impl VolunteerApplication {
    /// Reporter contact without the messaging-channel prefix.
    pub fn contact(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(|id| id.strip_prefix("whatsapp:").unwrap_or(id))
    }

    /// Best display name: full name, then WhatsApp name.
    pub fn display_name(&self) -> &str {
        non_blank(self.full_name.as_deref())
            .or_else(|| non_blank(self.user_name.as_deref()))
            .unwrap_or("Anonymous")
    }
}

// ============================================================================
// Review
// ============================================================================

/// A reviewer's decision on one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { verifier: String },
    Reject { verifier: String, reason: String },
}

/// Body of the status-update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    pub verification_notes: String,
    pub verified_by: String,
}

impl ReviewDecision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approve { .. } => ApplicationStatus::Approved,
            ReviewDecision::Reject { .. } => ApplicationStatus::Rejected,
        }
    }

    /// Validate against the application's current status and build the
    /// update body.
    pub fn into_update(self, current: ApplicationStatus) -> Result<StatusUpdate, BuddyError> {
        let status = current.transition(self.target_status())?;
        match self {
            ReviewDecision::Approve { verifier } => {
                let verifier = required(&verifier, "Please enter your name to approve the request")?;
                Ok(StatusUpdate {
                    status,
                    verification_notes: format!(
                        "Join request approved by {}. Welcome to Traffic Buddy team!",
                        verifier
                    ),
                    verified_by: verifier.to_string(),
                })
            }
            ReviewDecision::Reject { verifier, reason } => {
                let verifier = required(&verifier, "Please enter your name")?;
                let reason = required(&reason, "Please provide a reason for rejection")?;
                Ok(StatusUpdate {
                    status,
                    verification_notes: reason.to_string(),
                    verified_by: verifier.to_string(),
                })
            }
        }
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, BuddyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(BuddyError::Validation(message.to_string()))
    } else {
        Ok(trimmed)
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl ApplicationStats {
    pub fn from_applications(applications: &[VolunteerApplication]) -> Self {
        let mut stats = Self::default();
        for app in applications {
            stats.record(app.status);
        }
        stats
    }

    pub fn record(&mut self, status: ApplicationStatus) {
        self.total += 1;
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Approved => self.approved += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
        }
    }

    /// Share of decided applications that were approved (0.0-1.0).
    pub fn approval_rate(&self) -> f64 {
        let decided = self.approved + self.rejected;
        if decided == 0 {
            0.0
        } else {
            self.approved as f64 / decided as f64
        }
    }
}

// ============================================================================
// Broadcast
// ============================================================================

/// Body of a broadcast request to citizens, volunteers and/or divisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub message: String,
    pub users: bool,
    pub volunteers: bool,
    pub divisions: Vec<String>,
}

impl BroadcastRequest {
    /// Validate and normalize: message required, at least one audience,
    /// divisions resolved to their catalog values.
    pub fn new(
        message: &str,
        users: bool,
        volunteers: bool,
        targets: &[String],
    ) -> Result<Self, BuddyError> {
        let message = required(message, "Please enter a message to broadcast")?;

        let mut resolved = Vec::with_capacity(targets.len());
        for name in targets {
            let division = divisions::lookup(name)
                .filter(|d| *d != divisions::UNKNOWN)
                .ok_or_else(|| BuddyError::Validation(format!("Unknown division '{}'", name)))?;
            if !resolved.iter().any(|v: &String| v == division.value) {
                resolved.push(division.value.to_string());
            }
        }

        if !users && !volunteers && resolved.is_empty() {
            return Err(BuddyError::Validation(
                "Please select at least one broadcast target (Users, Volunteers, or Divisions)"
                    .to_string(),
            ));
        }

        Ok(Self {
            message: message.to_string(),
            users,
            volunteers,
            divisions: resolved,
        })
    }
}
