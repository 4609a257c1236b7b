use std::{
    path::{Path, PathBuf},
    process::Command,
};
use humansize::BINARY;
use tracing::debug;
use walkdir::WalkDir;
use crate::error::ConfigError;

/// calculate the total size of a directory, asking `du` first
pub fn calculate_dir_size(dir: &Path) -> u64 {
    match du_size(dir) {
        Some(size) => size,
        None => {
            debug!(path = %dir.display(), "du unavailable, walking directory");
            walk_dir_size(dir)
        }
    }
}

fn du_size(dir: &Path) -> Option<u64> {
    let output = Command::new("du").arg("-sk").arg(dir).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let kb: u64 = stdout.split_whitespace().next()?.parse().ok()?;
    Some(kb * 1024)
}

/// sum of regular file sizes below `dir`; directories count as zero
pub fn walk_dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// format bytes as human readable size
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, BINARY)
}

/// expand a leading `~` to the user's home directory
pub fn expand_home(input: &str) -> Result<PathBuf, ConfigError> {
    let rest = if input == "~" {
        ""
    } else if let Some(rest) = input.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(input));
    };

    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// display a path relative to the home directory when possible
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return Path::new("~").join(relative).display().to_string();
        }
    }
    path.display().to_string()
}

/// truncate a string to a maximum length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
