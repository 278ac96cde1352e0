//! `buddyctl emails` - grouped email notification log

use super::read_input;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use buddy_shared::divisions::label_for;
use buddy_shared::envelope::decode_list;
use buddy_shared::{
    DashboardConfig, DeliveryStatus, GroupAccumulator, GroupedNotificationSummary,
    NotificationFilter, NotificationRecord, PageSpan, ReportMonth,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct EmailsRequest {
    pub input: PathBuf,
    /// Overrides the configured division scope.
    pub division: Option<String>,
    pub month: Option<ReportMonth>,
    pub status: Option<DeliveryStatus>,
    pub page: u32,
}

impl EmailsRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            division: None,
            month: None,
            status: None,
            page: 1,
        }
    }
}

/// One page of grouped notifications.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailsReport {
    /// Predicates applied before grouping, as backend query parameters.
    pub filters: BTreeMap<&'static str, String>,
    pub groups: Vec<GroupedNotificationSummary>,
    pub total_groups: usize,
    pub total_pages: u32,
    pub span: PageSpan,
    pub skipped: usize,
}

pub fn build_report(config: &DashboardConfig, request: &EmailsRequest) -> Result<EmailsReport> {
    let json = read_input(&request.input)?;
    let decoded = decode_list::<NotificationRecord>(&json)
        .with_context(|| format!("Failed to decode email records from {}", request.input.display()))?;

    let division = request.division.as_deref().or(config.scoped_division());
    let filter = NotificationFilter::new()
        .with_division(division)
        .with_month(request.month)
        .with_status(request.status);

    let fetched = decoded.items.len();
    let records = filter.apply(decoded.items);
    info!("{} of {} email records match the filters", records.len(), fetched);

    // Undecodable rows never reach the filter, so they count as skipped
    // whatever the filters are.
    let mut acc = GroupAccumulator::new();
    acc.note_malformed(decoded.malformed);
    acc.extend(&records);
    let skipped = acc.skipped();
    let groups = acc.finish();
    info!("Grouped into {} groups ({} skipped)", groups.len(), skipped);

    let span = PageSpan::checked(request.page, config.email_page_size(), groups.len() as u64)?;
    Ok(EmailsReport {
        filters: filter.to_query_pairs().into_iter().collect(),
        groups: span.slice(&groups).to_vec(),
        total_groups: groups.len(),
        total_pages: span.total_pages(),
        span,
        skipped,
    })
}

pub fn render(report: &EmailsReport) -> String {
    let mut out = vec![output::section("email records")];

    if !report.filters.is_empty() {
        let filters: Vec<String> = report.filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        out.push(format!("Filters: {}", filters.join(" ")));
    }
    out.push(output::THIN_SEPARATOR.to_string());

    if report.groups.is_empty() {
        out.push("No email records found.".to_string());
    } else {
        out.push(format!(
            "{:>4}  {:<12} {:<18} {:<14} {:>5}  {:<20} {}",
            "#", "Query", "Department", "Division", "Sent", "Last sent", "Status"
        ));
        for (serial, group) in (report.span.first_serial()..).zip(&report.groups) {
            out.push(format!(
                "{:>4}  {:<12} {:<18} {:<14} {:>5}  {:<20} {}",
                serial,
                output::truncate(&group.query_id, 12),
                output::truncate(&group.department_name, 18),
                output::truncate(label_for(&group.division), 14),
                group.recipients.len(),
                output::format_time(group.last_sent_at),
                output::delivery_badge(group.status),
            ));
            if let Some(subject) = &group.subject {
                out.push(format!("      Subject: {}", subject));
            }
            let recipients: Vec<&str> = group.recipients.iter().map(String::as_str).collect();
            out.push(format!("      To: {}", recipients.join(", ")));
        }
    }

    out.push(output::THIN_SEPARATOR.to_string());
    out.push(output::page_footer(&report.span));
    if report.skipped > 0 {
        out.push(format!("Skipped {} malformed record(s)", report.skipped));
    }
    out.join("\n")
}

pub fn run(config: &DashboardConfig, request: &EmailsRequest, format: OutputFormat) -> Result<String> {
    let report = build_report(config, request)?;
    match format {
        OutputFormat::Human => Ok(render(&report)),
        OutputFormat::Json => output::to_json(&report),
    }
}
