//! Dashboard configuration.
//!
//! Configuration lives in `traffic-buddy/config.toml` under the user config
//! directory, or wherever `$BUDDY_CONFIG` points. Every field has a default,
//! so a missing file is not an error.
//!
//! The division scope used to be read from the logged-in session when the
//! dashboard loaded. It is now an explicit setting resolved each time a
//! config is loaded, and callers pass it down to filters themselves.

use crate::error::BuddyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BUDDY_CONFIG";

const CONFIG_DIR: &str = "traffic-buddy";
const CONFIG_FILE: &str = "config.toml";

const MIN_PAGE_SIZE: u32 = 1;
const MAX_PAGE_SIZE: u32 = 100;

/// Email-records screen settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    /// Grouped rows per page (valid: 1-100)
    #[serde(default = "default_email_page_size")]
    pub page_size: u32,
}

fn default_email_page_size() -> u32 {
    10
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            page_size: default_email_page_size(),
        }
    }
}

/// Volunteer-management screen settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerSettings {
    /// Applications per page (valid: 1-100)
    #[serde(default = "default_volunteer_page_size")]
    pub page_size: u32,
}

fn default_volunteer_page_size() -> u32 {
    15
}

impl Default for VolunteerSettings {
    fn default() -> Self {
        Self {
            page_size: default_volunteer_page_size(),
        }
    }
}

/// Which division the operator is scoped to. `None` means all divisions
/// (a main admin rather than a division admin).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSettings {
    #[serde(default)]
    pub division: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub emails: EmailSettings,

    #[serde(default)]
    pub volunteers: VolunteerSettings,

    #[serde(default)]
    pub scope: ScopeSettings,

    #[serde(default)]
    pub log: LogConfig,
}

impl DashboardConfig {
    /// Discovered config path: `$BUDDY_CONFIG`, then the user config dir.
    pub fn discover_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path. Any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self, BuddyError> {
        let content = fs::read_to_string(path)
            .map_err(|e| BuddyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, BuddyError> {
        let config: DashboardConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load the discovered config. A missing file yields defaults; a file
    /// that exists but cannot be used is an error.
    pub fn try_load() -> Result<Self, BuddyError> {
        let Some(path) = Self::discover_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load the discovered config, falling back to defaults when the file
    /// is missing or unusable.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            warn!("Ignoring config: {}", e);
            Self::default()
        })
    }

    /// `--config` wins over discovery; an explicit path must load.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, BuddyError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Ok(Self::load()),
        }
    }

    /// Clamp email page size to the valid range (1-100)
    pub fn email_page_size(&self) -> u32 {
        self.emails.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Clamp volunteer page size to the valid range (1-100)
    pub fn volunteer_page_size(&self) -> u32 {
        self.volunteers.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Configured division scope, blank treated as unset.
    pub fn scoped_division(&self) -> Option<&str> {
        self.scope
            .division
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn to_toml(&self) -> Result<String, BuddyError> {
        toml::to_string_pretty(self).map_err(|e| BuddyError::Config(e.to_string()))
    }
}
