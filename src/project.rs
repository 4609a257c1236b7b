use std::path::PathBuf;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use crate::utils;

pub const UNKNOWN_VERSION: &str = "unknown";

/// Snapshot of one uv project, as seen by the last scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub python_version: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Local>>,
    pub has_venv: bool,
    pub has_lock: bool,
}

impl Project {
    pub fn format_size(&self) -> String {
        utils::format_size(self.size)
    }

    pub fn format_modified(&self) -> String {
        self.last_modified
            .map(|dt| dt.format("%a, %d %b %Y %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn days_since_modified(&self) -> Option<i64> {
        self.last_modified.map(|dt| (Local::now() - dt).num_days())
    }

    pub fn has_known_version(&self) -> bool {
        self.python_version != UNKNOWN_VERSION
    }
}
