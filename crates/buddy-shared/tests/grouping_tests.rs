//! Grouped notification aggregation over whole batches.

use buddy_shared::envelope::decode_list;
use buddy_shared::{
    group_notifications, DeliveryStatus, GroupAccumulator, GroupedNotificationSummary,
    NotificationFilter, NotificationRecord, ReportMonth, RequiredField, SkipReason,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

fn rec(id: &str, query: &str, dept: &str, email: &str, hour: u32, status: &str) -> NotificationRecord {
    NotificationRecord::new(id, query, dept, email)
        .with_sent_at(at(hour))
        .with_status(status)
}

fn mixed_batch() -> Vec<NotificationRecord> {
    let mut no_email = rec("r7", "q1", "PWD", "x@x.com", 23, "failed");
    no_email.recipient_email = None;
    let mut no_dept = rec("r8", "q3", "PWD", "y@x.com", 1, "sent");
    no_dept.department_name = Some(" ".into());

    vec![
        rec("r1", "q1", "PWD", "a@x.com", 10, "sent"),
        rec("r2", "q1", "PWD", "a@x.com", 11, "sent"),
        rec("r3", "q1", "Police", "b@x.com", 8, "FAILED"),
        rec("r4", "q2", "PWD", "c@x.com", 14, "sent"),
        rec("r5", "q2", "PWD", "d@x.com", 6, "failed"),
        NotificationRecord::new("r6", "q3", "Water", "e@x.com"),
        no_email,
        no_dept,
    ]
}

/// Group contents without ordering, for order-independence checks.
fn contents(groups: &[GroupedNotificationSummary]) -> HashMap<(String, String), (BTreeSet<String>, Option<DateTime<Utc>>, DeliveryStatus)> {
    groups
        .iter()
        .map(|g| {
            (
                (g.query_id.clone(), g.department_name.clone()),
                (g.recipients.clone(), g.last_sent_at, g.status),
            )
        })
        .collect()
}

#[test]
fn test_basic_scenario() {
    let records = vec![
        rec("r1", "q1", "PWD", "a@x.com", 10, "sent"),
        rec("r2", "q1", "PWD", "b@x.com", 12, "failed"),
        rec("r3", "q2", "PWD", "c@x.com", 9, "sent"),
    ];
    let batch = group_notifications(&records);

    assert_eq!(batch.skipped, 0);
    assert_eq!(batch.groups.len(), 2);

    let first = &batch.groups[0];
    assert_eq!(first.query_id, "q1");
    assert_eq!(first.department_name, "PWD");
    assert_eq!(
        first.recipients.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["a@x.com", "b@x.com"]
    );
    assert_eq!(first.last_sent_at, Some(at(12)));
    assert_eq!(first.status, DeliveryStatus::Failed);

    let second = &batch.groups[1];
    assert_eq!(second.query_id, "q2");
    assert_eq!(second.recipients.len(), 1);
    assert!(second.recipients.contains("c@x.com"));
    assert_eq!(second.last_sent_at, Some(at(9)));
    assert_eq!(second.status, DeliveryStatus::Sent);
}

#[test]
fn test_malformed_record_does_not_touch_its_group() {
    let mut broken = rec("r2", "q1", "PWD", "z@x.com", 23, "failed");
    broken.recipient_email = None;
    let records = vec![
        rec("r1", "q1", "PWD", "a@x.com", 10, "sent"),
        broken,
        rec("r3", "q1", "PWD", "b@x.com", 12, "sent"),
    ];
    let batch = group_notifications(&records);

    assert_eq!(batch.skipped, 1);
    assert_eq!(batch.groups.len(), 1);
    let g = &batch.groups[0];
    assert_eq!(g.record_count, 2);
    assert_eq!(g.recipients.len(), 2);
    assert_eq!(g.last_sent_at, Some(at(12)));
    assert_eq!(g.status, DeliveryStatus::Sent);
}

#[test]
fn test_group_count_matches_distinct_keys() {
    let records = mixed_batch();
    let batch = group_notifications(&records);

    let keys: HashSet<(&str, &str)> = records
        .iter()
        .filter(|r| r.recipient_email.is_some() && r.department_name.as_deref() != Some(" "))
        .map(|r| (r.query_id.as_deref().unwrap(), r.department_name.as_deref().unwrap()))
        .collect();
    assert_eq!(batch.groups.len(), keys.len());
    assert_eq!(batch.skipped, 2);
}

#[test]
fn test_group_invariants_hold() {
    let records = mixed_batch();
    let batch = group_notifications(&records);

    for g in &batch.groups {
        let contributing: Vec<&NotificationRecord> = records
            .iter()
            .filter(|r| {
                r.recipient_email.is_some()
                    && r.query_id.as_deref() == Some(g.query_id.as_str())
                    && r.department_name.as_deref() == Some(g.department_name.as_str())
            })
            .collect();

        let emails: BTreeSet<String> = contributing
            .iter()
            .filter_map(|r| r.recipient_email.clone())
            .collect();
        assert_eq!(g.recipients, emails, "recipients of {}", g.query_id);

        let latest = contributing.iter().filter_map(|r| r.sent_at).max();
        assert_eq!(g.last_sent_at, latest, "lastSentAt of {}", g.query_id);

        let any_failed = contributing
            .iter()
            .any(|r| r.delivery_status() == DeliveryStatus::Failed);
        assert_eq!(g.status == DeliveryStatus::Failed, any_failed, "status of {}", g.query_id);
    }
}

#[test]
fn test_group_without_any_send_time_sorts_last() {
    let batch = group_notifications(&mixed_batch());
    let last = batch.groups.last().unwrap();
    assert_eq!(last.query_id, "q3");
    assert_eq!(last.last_sent_at, None);

    let times: Vec<_> = batch.groups.iter().map(|g| g.last_sent_at).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);
}

#[test]
fn test_idempotent() {
    let records = mixed_batch();
    assert_eq!(group_notifications(&records), group_notifications(&records));
}

#[test]
fn test_order_independent() {
    let records = mixed_batch();
    let expected = contents(&group_notifications(&records).groups);

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(contents(&group_notifications(&reversed).groups), expected);

    for shift in 1..records.len() {
        let mut rotated = records.clone();
        rotated.rotate_left(shift);
        let batch = group_notifications(&rotated);
        assert_eq!(contents(&batch.groups), expected, "rotation {}", shift);
        assert_eq!(batch.skipped, 2);
    }
}

#[test]
fn test_chunked_accumulation_matches_single_pass() {
    let records = mixed_batch();
    let single = group_notifications(&records);

    let merged = records
        .chunks(3)
        .map(|chunk| {
            let mut acc = GroupAccumulator::new();
            acc.extend(chunk);
            acc
        })
        .fold(GroupAccumulator::new(), GroupAccumulator::merge);
    assert_eq!(merged.skipped(), single.skipped);
    assert_eq!(merged.finish(), single.groups);
}

#[test]
fn test_decode_then_group_envelope() {
    let json = r#"{
        "success": true,
        "data": [
            {"_id": "r1", "queryId": "q9", "departmentName": "PWD", "recipientEmail": "a@x.com",
             "sentAt": "2024-03-05T08:30:00Z", "status": "sent", "subject": "Signal fault",
             "division": "NIGDI", "queryType": "Traffic Signal"},
            {"_id": "r2", "queryId": "q9", "departmentName": "PWD", "recipientEmail": "b@x.com",
             "sentAt": "2024-03-05T09:00:00+05:30", "status": "Failed"},
            {"_id": "r3", "queryId": "q9", "departmentName": "PWD"}
        ],
        "total": 3,
        "totalPages": 1,
        "currentPage": 1
    }"#;
    let decoded = decode_list::<NotificationRecord>(json).unwrap();
    assert_eq!(decoded.malformed, 0);
    let batch = group_notifications(&decoded.items);

    assert_eq!(batch.skipped, 1);
    let g = &batch.groups[0];
    assert_eq!(g.subject.as_deref(), Some("Signal fault"));
    assert_eq!(g.division, "NIGDI");
    assert_eq!(g.query_type.as_deref(), Some("Traffic Signal"));
    assert_eq!(g.status, DeliveryStatus::Failed);
    // 09:00+05:30 is 03:30Z, earlier than 08:30Z.
    assert_eq!(
        g.last_sent_at,
        Some(Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap())
    );
}

#[test]
fn test_mistyped_rows_do_not_sink_the_batch() {
    let json = r#"[
        {"_id": "r1", "queryId": "q1", "departmentName": "PWD", "recipientEmail": "a@x.com",
         "sentAt": "2024-03-05T08:30:00Z", "status": "sent"},
        {"_id": "r2", "queryId": 7, "departmentName": "PWD", "recipientEmail": "b@x.com"},
        {"_id": "r3", "queryId": "q1", "departmentName": "PWD", "recipientEmail": "c@x.com",
         "sentAt": 1709627400000, "status": "failed"},
        {"_id": "r4", "queryId": "q2", "departmentName": ["PWD"], "recipientEmail": "d@x.com"},
        {"_id": "r5", "queryId": "q2", "departmentName": "Police"}
    ]"#;
    let decoded = decode_list::<NotificationRecord>(json).unwrap();
    assert_eq!(decoded.items.len(), 3);
    assert_eq!(decoded.malformed, 2);

    let mut acc = GroupAccumulator::new();
    acc.note_malformed(decoded.malformed);
    acc.extend(&decoded.items);
    assert_eq!(acc.skipped(), 3);
    assert_eq!(acc.skip_tally().get(&SkipReason::Malformed), Some(&2));
    assert_eq!(
        acc.skip_tally().get(&SkipReason::Missing(RequiredField::RecipientEmail)),
        Some(&1)
    );

    let groups = acc.finish();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].recipients.len(), 2);
    assert_eq!(groups[0].status, DeliveryStatus::Failed);
    assert_eq!(groups[0].last_sent_at, Some(Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap()));
}

#[test]
fn test_filter_before_grouping() {
    let records = vec![
        rec("r1", "q1", "PWD", "a@x.com", 10, "sent").with_division("NIGDI"),
        rec("r2", "q1", "PWD", "b@x.com", 12, "failed").with_division("Pimpri"),
        rec("r3", "q2", "PWD", "c@x.com", 9, "sent").with_division("PIMPRI"),
    ];
    let filter = NotificationFilter::new()
        .with_division(Some("pimpri"))
        .with_month(Some(ReportMonth::new(2024, 1).unwrap()));
    let batch = group_notifications(&filter.apply(records));

    assert_eq!(batch.groups.len(), 2);
    assert_eq!(batch.groups[0].query_id, "q1");
    assert_eq!(batch.groups[0].recipients.len(), 1);
    assert!(batch.groups[0].recipients.contains("b@x.com"));
}
