//! Output formatting - ASCII tables with colored status badges
//!
//! Renderers return strings; `main` does the printing.

use anyhow::{Context, Result};
use buddy_shared::{ApplicationStatus, DeliveryStatus, PageItem, PageSpan};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";

/// Human tables or pretty JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// `[TITLE]` header line.
pub fn section(title: &str) -> String {
    format!("[{}]", title.to_uppercase())
}

pub fn delivery_badge(status: DeliveryStatus) -> String {
    match status {
        DeliveryStatus::Sent => "[SENT]".bright_green().to_string(),
        DeliveryStatus::Failed => "[FAILED]".bright_red().to_string(),
    }
}

pub fn application_badge(status: ApplicationStatus) -> String {
    match status {
        ApplicationStatus::Pending => "[PENDING]".yellow().to_string(),
        ApplicationStatus::Approved => "[APPROVED]".bright_green().to_string(),
        ApplicationStatus::Rejected => "[REJECTED]".bright_red().to_string(),
    }
}

/// `2024-01-01 12:00 UTC`, or `-` when unknown.
pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "-".to_string(),
    }
}

/// Cut to `width` characters, marking the cut with `~`.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

/// Page strip with the current page bracketed: `1 ... 8 9 [10] 11 12 ... 20`.
pub fn page_strip(span: &PageSpan) -> Option<String> {
    let items = span.window();
    if items.is_empty() {
        return None;
    }
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == span.page() => format!("[{}]", n).cyan().to_string(),
            other => other.to_string(),
        })
        .collect();
    Some(parts.join(" "))
}

/// "Showing ..." line plus the page strip when there is more than one page.
pub fn page_footer(span: &PageSpan) -> String {
    let mut footer = span.showing();
    if let Some(strip) = page_strip(span) {
        footer.push_str("\nPages: ");
        footer.push_str(&strip);
    }
    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_section() {
        assert_eq!(section("email records"), "[EMAIL RECORDS]");
    }

    #[test]
    fn test_format_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap();
        assert_eq!(format_time(Some(ts)), "2024-01-01 12:05 UTC");
        assert_eq!(format_time(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pothole", 10), "Pothole");
        assert_eq!(truncate("Signal not working", 8), "Signal ~");
    }

    #[test]
    fn test_badges_name_status() {
        assert!(delivery_badge(DeliveryStatus::Failed).contains("FAILED"));
        assert!(application_badge(ApplicationStatus::Pending).contains("PENDING"));
    }

    #[test]
    fn test_footer_single_page_has_no_strip() {
        let span = PageSpan::new(1, 10, 4);
        assert_eq!(page_footer(&span), "Showing 1 - 4 of 4 Records");
    }

    #[test]
    fn test_footer_marks_current_page() {
        let span = PageSpan::new(2, 10, 25);
        let footer = page_footer(&span);
        assert!(footer.starts_with("Showing 11 - 20 of 25 Records\nPages: 1 "));
        assert!(footer.contains("[2]"));
        assert!(footer.ends_with(" 3"));
    }
}
