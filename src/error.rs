/*!
 * Error types for dxtpack
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::manifest::ValidationIssue;

pub type Result<T> = std::result::Result<T, PackError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug)]
pub enum PackError {
    /// Extension directory does not exist
    SourceNotFound(PathBuf),

    /// Extension path exists but is not a directory
    NotADirectory(PathBuf),

    /// No manifest.json at the extension root
    ManifestNotFound(PathBuf),

    /// Manifest creation was declined or could not be completed
    ManifestDeclined,

    /// Manifest bytes are not valid JSON
    ManifestParse(String),

    /// Manifest failed schema validation (every issue is kept)
    ManifestInvalid(Vec<ValidationIssue>),

    /// I/O error
    Io(io::Error),

    /// A file could not be read during discovery
    FileRead { path: PathBuf, source: io::Error },

    /// A relative path cannot be stored as an archive entry name
    InvalidEntryName(PathBuf),

    /// Archive construction or verification failed
    Archive(String),

    /// Configuration error
    Config(String),

    /// Generic error with message
    Other(String),
}

impl PackError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PackError::Config(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            PackError::SourceNotFound(_)
            | PackError::NotADirectory(_)
            | PackError::ManifestNotFound(_)
            | PackError::ManifestDeclined
            | PackError::Config(_) => ErrorCategory::Configuration,
            PackError::ManifestParse(_) | PackError::ManifestInvalid(_) => {
                ErrorCategory::Validation
            }
            PackError::Io(_) | PackError::FileRead { .. } => ErrorCategory::Io,
            PackError::InvalidEntryName(_) | PackError::Archive(_) => ErrorCategory::Archive,
            PackError::Other(_) => ErrorCategory::Unknown,
        }
    }

    /// Validation issues carried by this error, if any
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            PackError::ManifestInvalid(issues) => issues,
            _ => &[],
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing directory, missing manifest, declined creation, bad config
    Configuration,
    /// Manifest schema or JSON syntax problems
    Validation,
    /// Filesystem errors during discovery or writing
    Io,
    /// Container encoding errors
    Archive,
    /// Anything else caught at the orchestrator boundary
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Archive => write!(f, "archive"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::SourceNotFound(path) => {
                write!(f, "Directory not found: {}", path.display())
            }
            PackError::NotADirectory(path) => {
                write!(f, "Not a directory: {}", path.display())
            }
            PackError::ManifestNotFound(path) => {
                write!(f, "Manifest not found: {}", path.display())
            }
            PackError::ManifestDeclined => {
                write!(f, "Cannot pack extension without a valid manifest.json")
            }
            PackError::ManifestParse(msg) => {
                write!(f, "Manifest is not valid JSON: {}", msg)
            }
            PackError::ManifestInvalid(issues) => {
                write!(f, "Manifest validation failed with {} error(s)", issues.len())?;
                for issue in issues {
                    write!(f, "\n  - {}", issue)?;
                }
                Ok(())
            }
            PackError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            PackError::FileRead { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            PackError::InvalidEntryName(path) => {
                write!(
                    f,
                    "Path cannot be stored in the archive: {}",
                    path.display()
                )
            }
            PackError::Archive(msg) => {
                write!(f, "Archive error: {}", msg)
            }
            PackError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            PackError::Other(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PackError::Io(err) => Some(err),
            PackError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for PackError {
    fn from(err: io::Error) -> Self {
        PackError::Io(err)
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::ManifestParse(err.to_string())
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(err: zip::result::ZipError) -> Self {
        PackError::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            PackError::SourceNotFound(PathBuf::from("/tmp/x")).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            PackError::ManifestParse("eof".to_string()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            PackError::Io(io::Error::other("boom")).category(),
            ErrorCategory::Io
        );
        assert_eq!(
            PackError::Archive("bad".to_string()).category(),
            ErrorCategory::Archive
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PackError::Config("x".to_string()).exit_code(), EXIT_USAGE);
        assert_eq!(PackError::ManifestDeclined.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_invalid_manifest_display_lists_every_issue() {
        let err = PackError::ManifestInvalid(vec![
            ValidationIssue::new("name", "must not be empty"),
            ValidationIssue::new("version", "\"version\" is a required property"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Manifest validation failed with 2 error(s)"));
        assert!(msg.contains("  - name: must not be empty"));
        assert!(msg.contains("  - version: "));
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn test_file_read_source() {
        use std::error::Error;

        let err = PackError::FileRead {
            path: PathBuf::from("server/main.py"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Failed to read server/main.py: gone");
    }
}
