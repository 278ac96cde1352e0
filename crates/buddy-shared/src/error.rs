//! Error types for the Traffic Buddy dashboard core.
//!
//! Aggregation never returns these: malformed notification records are
//! skipped, not raised. Errors cover user input, configuration and decoding.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Page {page} is out of range (1-{total_pages})")]
    InvalidPage { page: u32, total_pages: u32 },

    #[error("Cannot move application from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0}")]
    Validation(String),

    #[error("Backend reported failure: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BuddyError {
    /// Stable numeric code, used by the CLI as a process exit status.
    pub fn code(&self) -> i32 {
        match self {
            BuddyError::InvalidMonth(_) => 64,
            BuddyError::InvalidPage { .. } => 64,
            BuddyError::Validation(_) => 64,
            BuddyError::InvalidTransition { .. } => 65,
            BuddyError::Backend(_) => 69,
            BuddyError::Json(_) => 65,
            BuddyError::Config(_) => 78,
            BuddyError::Toml(_) => 78,
            BuddyError::Io(_) => 74,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuddyError>;
