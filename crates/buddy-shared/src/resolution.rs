//! Average resolution time by division.
//!
//! The dashboard endpoint reports one row per (division, bucket) with an
//! average and a count; rows are re-weighted into one average per division.

use crate::records::{non_blank, UNKNOWN_DIVISION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query type the resolution chart is drawn for unless told otherwise.
pub const CONGESTION_QUERY_TYPE: &str = "Traffic Congestion";

/// Parameters of the average-resolution-time endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionQuery {
    pub query_type: String,
}

impl Default for ResolutionQuery {
    fn default() -> Self {
        Self {
            query_type: CONGESTION_QUERY_TYPE.to_string(),
        }
    }
}

impl ResolutionQuery {
    /// Blank input keeps the congestion default.
    pub fn with_query_type(mut self, query_type: Option<&str>) -> Self {
        if let Some(query_type) = non_blank(query_type) {
            self.query_type = query_type.trim().to_string();
        }
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("queryType", self.query_type.clone())]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DivisionRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// One row of the average-resolution-time endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSample {
    #[serde(default)]
    pub division: Option<DivisionRef>,
    #[serde(default)]
    pub average_resolution_time_hours: f64,
    #[serde(default)]
    pub resolved_query_count: u64,
}

impl ResolutionSample {
    pub fn new(division: &str, average_hours: f64, count: u64) -> Self {
        Self {
            division: Some(DivisionRef { name: Some(division.to_string()) }),
            average_resolution_time_hours: average_hours,
            resolved_query_count: count,
        }
    }

    fn division_name(&self) -> &str {
        self.division
            .as_ref()
            .and_then(|d| non_blank(d.name.as_deref()))
            .unwrap_or(UNKNOWN_DIVISION)
    }
}

/// Weighted average resolution time of one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionResolution {
    pub name: String,
    /// Hours, rounded to two decimals.
    pub value: f64,
    pub count: u64,
}

#[derive(Default)]
struct Weighted {
    hours_x_count: f64,
    count: u64,
}

/// Slowest division first. Divisions without resolved queries are dropped.
pub fn average_by_division(samples: &[ResolutionSample]) -> Vec<DivisionResolution> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_division: HashMap<&str, Weighted> = HashMap::new();

    for sample in samples {
        let name = sample.division_name();
        let entry = by_division.entry(name).or_insert_with(|| {
            order.push(name);
            Weighted::default()
        });
        entry.hours_x_count += sample.average_resolution_time_hours * sample.resolved_query_count as f64;
        entry.count += sample.resolved_query_count;
    }

    let mut result: Vec<DivisionResolution> = order
        .into_iter()
        .filter_map(|name| {
            let w = by_division.get(name)?;
            if w.count == 0 {
                return None;
            }
            Some(DivisionResolution {
                name: name.to_string(),
                value: round2(w.hours_x_count / w.count as f64),
                count: w.count,
            })
        })
        .collect();

    result.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    result
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
