//! Command handlers
//!
//! Each handler reads its input file, builds a report with `buddy_shared`,
//! and renders it as text or JSON. Nothing here prints.

pub mod analytics;
pub mod emails;
pub mod volunteers;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
