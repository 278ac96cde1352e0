//! `buddyctl volunteers ...` - volunteer join-request review

use super::read_input;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use buddy_shared::divisions::label_for;
use buddy_shared::envelope::decode_list;
use buddy_shared::{
    ApplicationQuery, ApplicationStats, ApplicationStatus, BroadcastRequest, DashboardConfig,
    PageSpan, ReportMonth, ReviewDecision, StatusUpdate, VolunteerApplication,
};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn load_applications(input: &Path) -> Result<Vec<VolunteerApplication>> {
    let json = read_input(input)?;
    let decoded = decode_list(&json)
        .with_context(|| format!("Failed to decode volunteer applications from {}", input.display()))?;
    if decoded.malformed > 0 {
        warn!("Dropped {} malformed applications from {}", decoded.malformed, input.display());
    }
    Ok(decoded.items)
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Clone)]
pub struct ListRequest {
    pub input: PathBuf,
    /// Status tab: "all", "pending", "approved" or "rejected".
    pub status: String,
    pub month: Option<ReportMonth>,
    /// Overrides the configured division scope.
    pub division: Option<String>,
    pub search: Option<String>,
    pub page: u32,
}

impl ListRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            status: "all".to_string(),
            month: None,
            division: None,
            search: None,
            page: 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
    pub applications: Vec<VolunteerApplication>,
    /// Counts over every application matching the filters, not just this page.
    pub stats: ApplicationStats,
    pub total_pages: u32,
    pub span: PageSpan,
}

pub fn build_list(config: &DashboardConfig, request: &ListRequest) -> Result<ApplicationPage> {
    let query = ApplicationQuery {
        page: request.page,
        limit: config.volunteer_page_size(),
        status: ApplicationQuery::parse_status_tab(&request.status)?,
        month: request.month,
        ..Default::default()
    }
    .with_division(request.division.as_deref().or(config.scoped_division()))
    .with_search(request.search.as_deref());

    let applications = load_applications(&request.input)?;
    let fetched = applications.len();
    let matching: Vec<VolunteerApplication> =
        applications.into_iter().filter(|app| query.matches(app)).collect();
    info!("{} of {} applications match the filters", matching.len(), fetched);

    let span = PageSpan::checked(query.page, query.limit, matching.len() as u64)?;
    Ok(ApplicationPage {
        applications: span.slice(&matching).to_vec(),
        stats: ApplicationStats::from_applications(&matching),
        total_pages: span.total_pages(),
        span,
    })
}

pub fn render_list(page: &ApplicationPage) -> String {
    let mut out = vec![output::section("volunteer applications"), output::THIN_SEPARATOR.to_string()];
    if page.applications.is_empty() {
        out.push("No applications found.".to_string());
    } else {
        out.push(format!(
            "{:>4}  {:<22} {:<16} {:<14} {:<20} {}",
            "#", "Name", "Contact", "Division", "Applied", "Status"
        ));
        for (serial, app) in (page.span.first_serial()..).zip(&page.applications) {
            out.push(format!(
                "{:>4}  {:<22} {:<16} {:<14} {:<20} {}",
                serial,
                output::truncate(app.display_name(), 22),
                output::truncate(app.contact().unwrap_or("-"), 16),
                output::truncate(label_for(app.division.as_deref().unwrap_or("-")), 14),
                output::format_time(app.applied_at),
                output::application_badge(app.status),
            ));
            if let Some(by) = &app.verified_by {
                out.push(format!("      Verified by: {}", by));
            }
        }
    }
    out.push(output::THIN_SEPARATOR.to_string());
    out.push(output::page_footer(&page.span));
    out.join("\n")
}

pub fn run_list(config: &DashboardConfig, request: &ListRequest, format: OutputFormat) -> Result<String> {
    let page = build_list(config, request)?;
    match format {
        OutputFormat::Human => Ok(render_list(&page)),
        OutputFormat::Json => output::to_json(&page),
    }
}

// ============================================================================
// Stats
// ============================================================================

pub fn build_stats(input: &Path) -> Result<ApplicationStats> {
    Ok(ApplicationStats::from_applications(&load_applications(input)?))
}

pub fn render_stats(stats: &ApplicationStats) -> String {
    [
        output::section("applications"),
        format!("Total:          {}", stats.total),
        format!("Pending:        {}", stats.pending),
        format!("Approved:       {}", stats.approved),
        format!("Rejected:       {}", stats.rejected),
        format!("Approval rate:  {:.1}%", stats.approval_rate() * 100.0),
    ]
    .join("\n")
}

pub fn run_stats(input: &Path, format: OutputFormat) -> Result<String> {
    let stats = build_stats(input)?;
    match format {
        OutputFormat::Human => Ok(render_stats(&stats)),
        OutputFormat::Json => output::to_json(&stats),
    }
}

// ============================================================================
// Review
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

/// Build the status-update body for one review.
pub fn build_review(
    decision: Decision,
    verifier: &str,
    reason: Option<&str>,
    current: ApplicationStatus,
) -> Result<StatusUpdate> {
    let decision = match decision {
        Decision::Approve => ReviewDecision::Approve {
            verifier: verifier.to_string(),
        },
        Decision::Reject => ReviewDecision::Reject {
            verifier: verifier.to_string(),
            reason: reason.unwrap_or_default().to_string(),
        },
    };
    Ok(decision.into_update(current)?)
}

pub fn render_review(update: &StatusUpdate) -> String {
    [
        format!("{} {}", output::section("review"), output::application_badge(update.status)),
        format!("Verified by: {}", update.verified_by),
        format!("Notes:       {}", update.verification_notes),
    ]
    .join("\n")
}

pub fn run_review(
    decision: Decision,
    verifier: &str,
    reason: Option<&str>,
    current: ApplicationStatus,
    format: OutputFormat,
) -> Result<String> {
    let update = build_review(decision, verifier, reason, current)?;
    match format {
        OutputFormat::Human => Ok(render_review(&update)),
        OutputFormat::Json => output::to_json(&update),
    }
}

// ============================================================================
// Broadcast
// ============================================================================

pub fn render_broadcast(request: &BroadcastRequest) -> String {
    let mut audience = Vec::new();
    if request.users {
        audience.push("users".to_string());
    }
    if request.volunteers {
        audience.push("volunteers".to_string());
    }
    audience.extend(request.divisions.iter().map(|d| label_for(d).to_string()));

    [
        output::section("broadcast"),
        format!("Audience: {}", audience.join(", ")),
        output::THIN_SEPARATOR.to_string(),
        request.message.clone(),
    ]
    .join("\n")
}

pub fn run_broadcast(
    message: &str,
    users: bool,
    volunteers: bool,
    divisions: &[String],
    format: OutputFormat,
) -> Result<String> {
    let request = BroadcastRequest::new(message, users, volunteers, divisions)?;
    match format {
        OutputFormat::Human => Ok(render_broadcast(&request)),
        OutputFormat::Json => output::to_json(&request),
    }
}
