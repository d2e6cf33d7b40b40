/*!
 * Configuration types for dxtpack
 */

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PackError, Result};

/// Name of the manifest file expected at the extension root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Default ignore file name
pub const DEFAULT_IGNORE_FILE: &str = ".dxtignore";

/// File extension of the produced archive
pub const ARCHIVE_EXTENSION: &str = "dxt";

/// Highest Deflate level accepted
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Main configuration for pack operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Deflate level 1-9; 0 stores entries uncompressed
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Modification time written for every archive entry
    #[serde(default = "default_timestamp")]
    pub timestamp: String,

    /// Ignore file name, relative to the extension root
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Patterns evaluated after the ignore file
    #[serde(default)]
    pub extra_ignore: Vec<String>,

    /// Re-open the built archive and read every entry back
    #[serde(default = "default_true")]
    pub verify_archive: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            timestamp: default_timestamp(),
            ignore_file: default_ignore_file(),
            extra_ignore: Vec::new(),
            verify_archive: true,
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Entry timestamp broken into the fields a ZIP header stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for EntryTimestamp {
    fn default() -> Self {
        Self {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_compression_level() -> u32 {
    MAX_COMPRESSION_LEVEL
}

fn default_timestamp() -> String {
    "1980-01-01T00:00:00".to_string()
}

fn default_ignore_file() -> String {
    DEFAULT_IGNORE_FILE.to_string()
}

impl PackConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PackError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: PackConfig = toml::from_str(&contents)
            .map_err(|e| PackError::Config(format!("Invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PackError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(PackError::Config(format!(
                "compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            )));
        }
        self.entry_timestamp()?;
        if self.ignore_file.trim().is_empty() {
            return Err(PackError::Config("ignore_file must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parse `timestamp` into the fields stored in each archive entry.
    ///
    /// ZIP stores DOS time, which starts in 1980 and ends in 2107.
    pub fn entry_timestamp(&self) -> Result<EntryTimestamp> {
        let parsed = NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| {
                PackError::Config(format!("Invalid timestamp '{}': {}", self.timestamp, e))
            })?;

        if !(1980..=2107).contains(&parsed.year()) {
            return Err(PackError::Config(format!(
                "timestamp year must be between 1980 and 2107, got {}",
                parsed.year()
            )));
        }

        Ok(EntryTimestamp {
            year: parsed.year() as u16,
            month: parsed.month() as u8,
            day: parsed.day() as u8,
            hour: parsed.hour() as u8,
            minute: parsed.minute() as u8,
            second: parsed.second() as u8,
        })
    }

    /// Effective log level after applying `verbose`
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PackConfig::default();
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.ignore_file, ".dxtignore");
        assert!(config.verify_archive);
        assert!(config.extra_ignore.is_empty());
        assert_eq!(config.entry_timestamp().unwrap(), EntryTimestamp::default());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: PackConfig = toml::from_str("").unwrap();
        assert_eq!(config, PackConfig::default());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dxtpack.toml");

        let config = PackConfig {
            compression_level: 6,
            extra_ignore: vec!["*.pyc".to_string()],
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = PackConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_level_out_of_range() {
        let config = PackConfig {
            compression_level: 10,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PackError::Config(_))));
    }

    #[test]
    fn test_rejects_pre_dos_epoch_timestamp() {
        let config = PackConfig {
            timestamp: "1970-01-01T00:00:00".to_string(),
            ..Default::default()
        };
        assert!(config.entry_timestamp().is_err());
    }

    #[test]
    fn test_custom_timestamp() {
        let config = PackConfig {
            timestamp: "2024-06-30T12:34:56".to_string(),
            ..Default::default()
        };
        let ts = config.entry_timestamp().unwrap();
        assert_eq!(ts.year, 2024);
        assert_eq!(ts.month, 6);
        assert_eq!(ts.second, 56);
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = PackConfig {
            log_level: LogLevel::Error,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.effective_log_level(), LogLevel::Debug);
    }
}
