//! Daily query trend breakdown for a division's recent activity.

use crate::error::BuddyError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCount {
    #[serde(rename = "_id")]
    pub date: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountKey {
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub key: StatusCountKey,
    #[serde(default)]
    pub count: u64,
}

/// The `stats.recent` block of the division stats endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStats {
    #[serde(default)]
    pub daily_counts: Vec<DailyCount>,
    #[serde(default)]
    pub status_counts: Vec<StatusCount>,
}

#[derive(Debug, Default, Deserialize)]
struct DivisionStats {
    #[serde(default)]
    recent: Option<RecentStats>,
}

#[derive(Debug, Deserialize)]
struct DivisionStatsResponse {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stats: Option<DivisionStats>,
}

fn default_true() -> bool {
    true
}

/// Decode `{ success, stats: { recent: { dailyCounts, statusCounts } } }`.
/// A response without a `recent` block yields empty stats.
pub fn decode_division_stats(json: &str) -> Result<RecentStats, BuddyError> {
    let response: DivisionStatsResponse = serde_json::from_str(json)?;
    if !response.success {
        return Err(BuddyError::Backend(
            response.message.unwrap_or_else(|| "stats request failed".to_string()),
        ));
    }
    Ok(response.stats.and_then(|s| s.recent).unwrap_or_default())
}

/// One point of the trend chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    pub date: String,
    /// Total queries that day.
    pub queries: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub rejected: u64,
}

impl DailyTrend {
    fn set_status(&mut self, status: &str, count: u64) -> bool {
        let slot = match status {
            "Pending" => &mut self.pending,
            "In Progress" => &mut self.in_progress,
            "Resolved" => &mut self.resolved,
            "Rejected" => &mut self.rejected,
            _ => return false,
        };
        *slot = count;
        true
    }
}

/// One trend point per daily count, in input order. Status breakdowns
/// default to zero; unrecognized statuses are ignored.
pub fn daily_trends(stats: &RecentStats) -> Vec<DailyTrend> {
    let mut by_date: HashMap<&str, DailyTrend> = HashMap::new();
    for item in &stats.status_counts {
        let trend = by_date.entry(item.key.date.as_str()).or_default();
        if !trend.set_status(&item.key.status, item.count) {
            tracing::debug!("Ignoring unknown query status '{}' on {}", item.key.status, item.key.date);
        }
    }

    stats
        .daily_counts
        .iter()
        .map(|day| {
            let breakdown = by_date.get(day.date.as_str()).cloned().unwrap_or_default();
            DailyTrend {
                date: day.date.clone(),
                queries: day.count,
                ..breakdown
            }
        })
        .collect()
}
