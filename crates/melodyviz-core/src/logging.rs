//! Logging configuration
//!
//! The subscriber itself is installed by the binary; this module only holds
//! the settings and the log-file housekeeping.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

const LOG_FILE_PREFIX: &str = "melodyviz_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level: trace, debug, info, warn or error
    pub level: String,
    /// Directory holding log files
    pub log_directory: PathBuf,
    /// How many log files to keep
    pub max_log_files: usize,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_directory`
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: PathBuf::from("logs"),
            max_log_files: 10,
            console_output: true,
            file_output: false,
        }
    }
}

impl LogConfig {
    /// Parsed level; unknown names fall back to INFO
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Create the log directory if needed
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_directory)
    }

    /// Path of the log file for this run (timestamped, stable within a second)
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.log_directory
            .join(format!("{}{}{}", LOG_FILE_PREFIX, stamp, LOG_FILE_SUFFIX))
    }

    /// Delete the oldest log files beyond `max_log_files`. Returns how many were removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = std::fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_log_files;
        for path in &logs[..excess] {
            std::fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), Level::INFO);
        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level(), Level::DEBUG);
        config.level = "loud".to_string();
        assert_eq!(config.parse_level(), Level::INFO);
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_directory: dir.path().to_path_buf(),
            max_log_files: 2,
            ..LogConfig::default()
        };

        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            std::fs::write(dir.path().join(format!("melodyviz_{}.log", stamp)), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(config.cleanup_old_logs().unwrap(), 1);
        assert!(!dir.path().join("melodyviz_20240101_000000.log").exists());
        assert!(dir.path().join("melodyviz_20240103_000000.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_without_directory() {
        let config = LogConfig {
            log_directory: PathBuf::from("/nonexistent/melodyviz/logs"),
            ..LogConfig::default()
        };
        assert_eq!(config.cleanup_old_logs().unwrap(), 0);
    }
}
