//! Print the tail of the newest log file.

use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{log_dir, LOG_FILE_PREFIX};

const DEFAULT_LINES: usize = 50;

/// Prints the last lines of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined or read
/// - If the log file cannot be read
pub fn handle_logs() -> Result<(), anyhow::Error> {
    let log_dir = log_dir()?;

    if !log_dir.exists() {
        println!("No logs yet. They are written to {}", log_dir.display());
        return Ok(());
    }

    let Some(log_file) = find_latest_log(&log_dir)? else {
        println!("No log files found in {}", log_dir.display());
        return Ok(());
    };

    let content = fs::read_to_string(&log_file)
        .map_err(|e| anyhow!("Failed to read {}: {e}", log_file.display()))?;

    let lines = tail(&content, DEFAULT_LINES);
    println!("{} ({} lines shown)", log_file.display(), lines.len());
    println!();
    for line in lines {
        println!("{line}");
    }

    Ok(())
}

/// Last `count` lines of `content`.
fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

/// Most recently modified log file in `log_dir`, if any.
fn find_latest_log(log_dir: &Path) -> Result<Option<PathBuf>, anyhow::Error> {
    let entries =
        fs::read_dir(log_dir).map_err(|e| anyhow!("Failed to read log directory: {e}"))?;

    let latest = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
            if !is_log {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path);

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), vec!["b", "c"]);
        assert_eq!(tail("a\nb", 10), vec!["a", "b"]);
        assert!(tail("", 5).is_empty());
    }
}
