//! Grouped notification aggregation.
//!
//! Collapses flat notification-log rows into one summary per
//! (query, department) pair:
//! - recipients are unioned (set semantics)
//! - `last_sent_at` is the latest send
//! - status is `failed` if any contributing send failed
//!
//! The fold is order-independent for everything except the first-seen
//! descriptive fields (subject, division, query type), so partial
//! accumulators can be combined with [`GroupAccumulator::merge`].

use crate::records::{non_blank, DeliveryStatus, NotificationRecord, UNKNOWN_DIVISION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

/// Separator used in the textual form of a [`GroupKey`].
/// ASCII unit separator, never part of an identifier or department name.
pub const KEY_SEPARATOR: char = '\u{1f}';

// ============================================================================
// Field accessors
// ============================================================================

/// Field accessors the accumulator reads from a record.
///
/// Implemented for [`NotificationRecord`]; other row shapes (for example a
/// differently named export) can implement it to reuse the same fold.
pub trait GroupSource {
    fn record_id(&self) -> Option<&str>;
    fn query_id(&self) -> Option<&str>;
    fn department_name(&self) -> Option<&str>;
    fn recipient_email(&self) -> Option<&str>;
    fn sent_at(&self) -> Option<DateTime<Utc>>;
    fn status(&self) -> DeliveryStatus;

    fn subject(&self) -> Option<&str> {
        None
    }

    /// Raw division, `None` when absent.
    fn division(&self) -> Option<&str> {
        None
    }

    fn query_type(&self) -> Option<&str> {
        None
    }
}

impl GroupSource for NotificationRecord {
    fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    fn department_name(&self) -> Option<&str> {
        self.department_name.as_deref()
    }

    fn recipient_email(&self) -> Option<&str> {
        self.recipient_email.as_deref()
    }

    fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    fn status(&self) -> DeliveryStatus {
        self.delivery_status()
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn division(&self) -> Option<&str> {
        self.division.as_deref()
    }

    fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }
}

// ============================================================================
// Key builder
// ============================================================================

/// Fields a record must carry to take part in aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    RecordId,
    QueryId,
    DepartmentName,
    RecipientEmail,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::RecordId => "recordId",
            RequiredField::QueryId => "queryId",
            RequiredField::DepartmentName => "departmentName",
            RequiredField::RecipientEmail => "recipientEmail",
        }
    }
}

/// Why a record was left out of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// A required field is absent or blank.
    Missing(RequiredField),
    /// The row could not be decoded as a record at all (wrong field types).
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing(field) => write!(f, "missing {}", field.as_str()),
            SkipReason::Malformed => f.write_str("malformed row"),
        }
    }
}

/// Composite grouping key: one group per (query, department).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub query_id: String,
    pub department_name: String,
}

impl GroupKey {
    /// Build the key for a record, or say which required field is missing.
    /// Blank strings count as missing.
    pub fn from_record<R: GroupSource + ?Sized>(record: &R) -> Result<Self, SkipReason> {
        require(record.record_id(), RequiredField::RecordId)?;
        let query_id = require(record.query_id(), RequiredField::QueryId)?;
        let department_name = require(record.department_name(), RequiredField::DepartmentName)?;
        require(record.recipient_email(), RequiredField::RecipientEmail)?;

        Ok(Self {
            query_id: query_id.to_string(),
            department_name: department_name.to_string(),
        })
    }
}

fn require(value: Option<&str>, field: RequiredField) -> Result<&str, SkipReason> {
    non_blank(value).ok_or(SkipReason::Missing(field))
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.query_id, KEY_SEPARATOR, self.department_name)
    }
}

// ============================================================================
// Output
// ============================================================================

/// One row of the grouped email log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedNotificationSummary {
    pub query_id: String,
    pub department_name: String,
    pub subject: Option<String>,
    pub division: String,
    pub query_type: Option<String>,
    /// Unique recipient addresses, sorted.
    pub recipients: BTreeSet<String>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    /// Well-formed records folded into this group, duplicates included.
    pub record_count: usize,
}

/// Result of a one-shot grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedBatch {
    pub groups: Vec<GroupedNotificationSummary>,
    pub skipped: usize,
}

// ============================================================================
// Accumulator
// ============================================================================

#[derive(Debug, Clone)]
struct GroupEntry {
    key: GroupKey,
    subject: Option<String>,
    division: Option<String>,
    query_type: Option<String>,
    recipients: BTreeSet<String>,
    last_sent_at: Option<DateTime<Utc>>,
    status: DeliveryStatus,
    record_count: usize,
}

impl GroupEntry {
    fn absorb(&mut self, other: GroupEntry) {
        keep_first(&mut self.subject, other.subject, "subject", &self.key);
        keep_first(&mut self.division, other.division, "division", &self.key);
        keep_first(&mut self.query_type, other.query_type, "queryType", &self.key);
        self.recipients.extend(other.recipients);
        // Option orders None below Some, so a missing time never wins.
        self.last_sent_at = self.last_sent_at.max(other.last_sent_at);
        self.status = self.status.worst(other.status);
        self.record_count += other.record_count;
    }

    fn into_summary(self) -> GroupedNotificationSummary {
        GroupedNotificationSummary {
            query_id: self.key.query_id,
            department_name: self.key.department_name,
            subject: self.subject,
            division: self.division.unwrap_or_else(|| UNKNOWN_DIVISION.to_string()),
            query_type: self.query_type,
            recipients: self.recipients,
            last_sent_at: self.last_sent_at,
            status: self.status,
            record_count: self.record_count,
        }
    }
}

fn keep_first(current: &mut Option<String>, incoming: Option<String>, field: &str, key: &GroupKey) {
    let Some(incoming) = incoming else { return };
    match current {
        None => *current = Some(incoming),
        Some(existing) if *existing != incoming => {
            debug!(
                "Conflicting {} for group {}: keeping '{}', ignoring '{}'",
                field, key, existing, incoming
            );
        }
        Some(_) => {}
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

/// Incremental key -> summary mapping.
///
/// Groups remember the order in which their key was first seen; the final
/// sort is stable on that order.
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    index: HashMap<GroupKey, usize>,
    entries: Vec<GroupEntry>,
    skipped: BTreeMap<SkipReason, usize>,
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in. Malformed records are counted and skipped.
    pub fn push<R: GroupSource + ?Sized>(&mut self, record: &R) -> Result<(), SkipReason> {
        let key = match GroupKey::from_record(record) {
            Ok(key) => key,
            Err(reason) => {
                *self.skipped.entry(reason).or_insert(0) += 1;
                debug!(
                    "Skipping notification record {}: {}",
                    record.record_id().unwrap_or("<no id>"),
                    reason
                );
                return Err(reason);
            }
        };

        let mut recipients = BTreeSet::new();
        if let Some(email) = non_blank(record.recipient_email()) {
            recipients.insert(email.trim().to_string());
        }

        let entry = GroupEntry {
            key,
            subject: owned(record.subject()),
            division: owned(record.division()),
            query_type: owned(record.query_type()),
            recipients,
            last_sent_at: record.sent_at(),
            status: record.status(),
            record_count: 1,
        };
        self.insert(entry);
        Ok(())
    }

    /// Fold every record of an iterator, ignoring skip results.
    pub fn extend<'a, R, I>(&mut self, records: I)
    where
        R: GroupSource + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        for record in records {
            let _ = self.push(record);
        }
    }

    /// Count rows that were dropped before they could be decoded.
    pub fn note_malformed(&mut self, count: usize) {
        if count > 0 {
            *self.skipped.entry(SkipReason::Malformed).or_insert(0) += count;
        }
    }

    fn insert(&mut self, entry: GroupEntry) {
        match self.index.get(&entry.key) {
            Some(&pos) => self.entries[pos].absorb(entry),
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Combine with another partial accumulator.
    ///
    /// Groups first seen in `self` keep their position; new groups from
    /// `other` follow in `other`'s order. Descriptive fields prefer `self`.
    pub fn merge(mut self, other: GroupAccumulator) -> GroupAccumulator {
        for entry in other.entries {
            self.insert(entry);
        }
        for (reason, count) in other.skipped {
            *self.skipped.entry(reason).or_insert(0) += count;
        }
        self
    }

    /// Number of distinct groups so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total malformed records skipped.
    pub fn skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Skipped records broken down by reason (first missing field, or
    /// undecodable).
    pub fn skip_tally(&self) -> &BTreeMap<SkipReason, usize> {
        &self.skipped
    }

    /// Finalize: most recently sent group first, ties in first-seen order.
    pub fn finish(self) -> Vec<GroupedNotificationSummary> {
        let mut groups: Vec<_> = self.entries.into_iter().map(GroupEntry::into_summary).collect();
        groups.sort_by(|a, b| b.last_sent_at.cmp(&a.last_sent_at));
        groups
    }
}

/// Group a fetched batch in one pass.
pub fn group_notifications<R: GroupSource>(records: &[R]) -> GroupedBatch {
    let mut acc = GroupAccumulator::new();
    acc.extend(records);
    let skipped = acc.skipped();
    let groups = acc.finish();
    info!(
        "Grouped {} notification records into {} groups ({} skipped)",
        records.len(),
        groups.len(),
        skipped
    );
    GroupedBatch { groups, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn rec(id: &str, query: &str, dept: &str, email: &str, hour: u32, status: &str) -> NotificationRecord {
        NotificationRecord::new(id, query, dept, email)
            .with_sent_at(at(hour))
            .with_status(status)
    }

    #[test]
    fn test_key_display_uses_separator() {
        let key = GroupKey::from_record(&rec("r1", "q1", "PWD", "a@x.com", 1, "sent")).unwrap();
        assert_eq!(key.to_string(), "q1\u{1f}PWD");
    }

    #[test]
    fn test_key_distinguishes_ambiguous_concatenations() {
        let a = GroupKey::from_record(&rec("r1", "q1-", "PWD", "a@x.com", 1, "sent")).unwrap();
        let b = GroupKey::from_record(&rec("r2", "q1", "-PWD", "a@x.com", 1, "sent")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_key_requires_fields() {
        let mut record = rec("r1", "q1", "PWD", "a@x.com", 1, "sent");
        record.recipient_email = None;
        assert_eq!(
            GroupKey::from_record(&record),
            Err(SkipReason::Missing(RequiredField::RecipientEmail))
        );

        let mut record = rec("r1", "q1", "PWD", "a@x.com", 1, "sent");
        record.record_id = Some("   ".into());
        assert_eq!(
            GroupKey::from_record(&record),
            Err(SkipReason::Missing(RequiredField::RecordId))
        );

        let mut record = rec("r1", "q1", "PWD", "a@x.com", 1, "sent");
        record.department_name = None;
        assert_eq!(
            GroupKey::from_record(&record),
            Err(SkipReason::Missing(RequiredField::DepartmentName))
        );
    }

    #[test]
    fn test_new_group_seeded_from_record() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "FAILED")).unwrap();
        let groups = acc.finish();
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.recipients.len(), 1);
        assert_eq!(g.last_sent_at, Some(at(10)));
        assert_eq!(g.status, DeliveryStatus::Failed);
        assert_eq!(g.division, UNKNOWN_DIVISION);
    }

    #[test]
    fn test_duplicate_recipient_counted_once() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "sent")).unwrap();
        acc.push(&rec("r2", "q1", "PWD", "a@x.com", 11, "sent")).unwrap();
        let groups = acc.finish();
        assert_eq!(groups[0].recipients.len(), 1);
        assert_eq!(groups[0].record_count, 2);
        assert_eq!(groups[0].last_sent_at, Some(at(11)));
    }

    #[test]
    fn test_first_seen_subject_wins() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "sent").with_subject("Pothole"))
            .unwrap();
        acc.push(&rec("r2", "q1", "PWD", "b@x.com", 11, "sent").with_subject("Retry: Pothole"))
            .unwrap();
        assert_eq!(acc.finish()[0].subject.as_deref(), Some("Pothole"));
    }

    #[test]
    fn test_missing_subject_filled_by_later_record() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "sent")).unwrap();
        acc.push(
            &rec("r2", "q1", "PWD", "b@x.com", 11, "sent")
                .with_subject("Signal broken")
                .with_division("NIGDI"),
        )
        .unwrap();
        let g = &acc.finish()[0];
        assert_eq!(g.subject.as_deref(), Some("Signal broken"));
        assert_eq!(g.division, "NIGDI");
    }

    #[test]
    fn test_missing_sent_at_never_wins() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "sent")).unwrap();
        acc.push(&NotificationRecord::new("r2", "q1", "PWD", "b@x.com")).unwrap();
        assert_eq!(acc.finish()[0].last_sent_at, Some(at(10)));
    }

    #[test]
    fn test_skip_tally_by_field() {
        let mut acc = GroupAccumulator::new();
        let mut no_query = rec("r1", "q1", "PWD", "a@x.com", 10, "sent");
        no_query.query_id = None;
        let mut no_email = rec("r2", "q1", "PWD", "a@x.com", 10, "sent");
        no_email.recipient_email = Some(String::new());
        assert!(acc.push(&no_query).is_err());
        assert!(acc.push(&no_email).is_err());
        assert_eq!(acc.skipped(), 2);
        assert_eq!(acc.skip_tally().get(&SkipReason::Missing(RequiredField::QueryId)), Some(&1));
        assert_eq!(
            acc.skip_tally().get(&SkipReason::Missing(RequiredField::RecipientEmail)),
            Some(&1)
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_malformed_rows_join_the_tally() {
        let mut acc = GroupAccumulator::new();
        acc.note_malformed(0);
        assert!(acc.skip_tally().is_empty());
        acc.note_malformed(2);
        acc.push(&rec("r1", "q1", "PWD", "a@x.com", 10, "sent")).unwrap();
        assert_eq!(acc.skipped(), 2);
        assert_eq!(acc.skip_tally().get(&SkipReason::Malformed), Some(&2));
        assert_eq!(acc.finish().len(), 1);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut acc = GroupAccumulator::new();
        acc.push(&rec("r1", "q2", "PWD", "a@x.com", 9, "sent")).unwrap();
        acc.push(&rec("r2", "q1", "PWD", "a@x.com", 9, "sent")).unwrap();
        acc.push(&rec("r3", "q3", "PWD", "a@x.com", 12, "sent")).unwrap();
        let ids: Vec<_> = acc.finish().into_iter().map(|g| g.query_id).collect();
        assert_eq!(ids, vec!["q3", "q2", "q1"]);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let records = vec![
            rec("r1", "q1", "PWD", "a@x.com", 10, "sent"),
            rec("r2", "q1", "PWD", "b@x.com", 12, "failed"),
            rec("r3", "q2", "PWD", "c@x.com", 9, "sent"),
            rec("r4", "q2", "PWD", "c@x.com", 8, "sent"),
        ];

        let mut whole = GroupAccumulator::new();
        whole.extend(&records);

        let mut left = GroupAccumulator::new();
        left.extend(&records[..2]);
        let mut right = GroupAccumulator::new();
        right.extend(&records[2..]);

        assert_eq!(left.merge(right).finish(), whole.finish());
    }

    #[test]
    fn test_empty_batch() {
        let batch = group_notifications::<NotificationRecord>(&[]);
        assert!(batch.groups.is_empty());
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let batch = group_notifications(&[rec("r1", "q1", "PWD", "a@x.com", 10, "sent")]);
        let json = serde_json::to_value(&batch).unwrap();
        let group = &json["groups"][0];
        assert_eq!(group["queryId"], "q1");
        assert_eq!(group["departmentName"], "PWD");
        assert_eq!(group["status"], "sent");
        assert_eq!(group["recordCount"], 1);
        assert_eq!(group["recipients"][0], "a@x.com");
    }
}
