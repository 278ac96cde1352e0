//! `buddyctl resolution`, `buddyctl trends`, `buddyctl months`

use super::read_input;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use buddy_shared::divisions::label_for;
use buddy_shared::envelope::decode_list;
use buddy_shared::resolution::{average_by_division, DivisionResolution, ResolutionQuery, ResolutionSample};
use buddy_shared::trends::{daily_trends, decode_division_stats, DailyTrend};
use buddy_shared::ReportMonth;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

const BAR_WIDTH: usize = 30;

// ============================================================================
// Average resolution time
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// Endpoint query parameters the export was fetched with.
    pub filters: BTreeMap<&'static str, String>,
    pub divisions: Vec<DivisionResolution>,
    pub skipped: usize,
}

/// `input` holds the endpoint response for `query`.
pub fn resolution_report(input: &Path, query: &ResolutionQuery) -> Result<ResolutionReport> {
    let json = read_input(input)?;
    let decoded = decode_list::<ResolutionSample>(&json)
        .with_context(|| format!("Failed to decode resolution times from {}", input.display()))?;
    if decoded.malformed > 0 {
        warn!("Dropped {} malformed resolution rows from {}", decoded.malformed, input.display());
    }
    Ok(ResolutionReport {
        filters: query.to_query_pairs().into_iter().collect(),
        divisions: average_by_division(&decoded.items),
        skipped: decoded.malformed,
    })
}

pub fn render_resolution(report: &ResolutionReport) -> String {
    let mut out = vec![output::section("average resolution time")];
    if let Some(query_type) = report.filters.get("queryType") {
        out.push(format!("Query type: {}", query_type));
    }
    out.push(output::THIN_SEPARATOR.to_string());

    let rows = &report.divisions;
    if rows.is_empty() {
        out.push("No resolved queries.".to_string());
        return out.join("\n");
    }

    // Rows arrive slowest first, so the first value is the scale.
    let max = rows[0].value;
    for row in rows {
        let bar_len = if max > 0.0 {
            ((row.value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push(format!(
            "{:<14} {:>8.2} h  {:>5} resolved  {}",
            label_for(&row.name),
            row.value,
            row.count,
            "#".repeat(bar_len)
        ));
    }
    out.join("\n")
}

pub fn run_resolution(input: &Path, query: &ResolutionQuery, format: OutputFormat) -> Result<String> {
    let report = resolution_report(input, query)?;
    match format {
        OutputFormat::Human => Ok(render_resolution(&report)),
        OutputFormat::Json => output::to_json(&report),
    }
}

// ============================================================================
// Query trends
// ============================================================================

pub fn trends_report(input: &Path) -> Result<Vec<DailyTrend>> {
    let json = read_input(input)?;
    let stats = decode_division_stats(&json)
        .with_context(|| format!("Failed to decode division stats from {}", input.display()))?;
    Ok(daily_trends(&stats))
}

pub fn render_trends(trends: &[DailyTrend]) -> String {
    let mut out = vec![output::section("query trends"), output::THIN_SEPARATOR.to_string()];
    if trends.is_empty() {
        out.push("No recent activity.".to_string());
        return out.join("\n");
    }
    out.push(format!(
        "{:<12} {:>8} {:>8} {:>12} {:>9} {:>9}",
        "Date", "Queries", "Pending", "In Progress", "Resolved", "Rejected"
    ));
    for t in trends {
        out.push(format!(
            "{:<12} {:>8} {:>8} {:>12} {:>9} {:>9}",
            t.date, t.queries, t.pending, t.in_progress, t.resolved, t.rejected
        ));
    }
    out.join("\n")
}

pub fn run_trends(input: &Path, format: OutputFormat) -> Result<String> {
    let trends = trends_report(input)?;
    match format {
        OutputFormat::Human => Ok(render_trends(&trends)),
        OutputFormat::Json => output::to_json(&trends),
    }
}

// ============================================================================
// Month selector
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MonthOption {
    pub value: ReportMonth,
    pub label: String,
}

pub fn month_options(today: NaiveDate, count: usize) -> Vec<MonthOption> {
    ReportMonth::recent(today, count)
        .into_iter()
        .map(|month| MonthOption {
            value: month,
            label: month.label(),
        })
        .collect()
}

pub fn run_months(today: NaiveDate, count: usize, format: OutputFormat) -> Result<String> {
    let options = month_options(today, count);
    match format {
        OutputFormat::Human => Ok(options
            .iter()
            .map(|m| format!("{}  {}", m.value, m.label))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => output::to_json(&options),
    }
}
