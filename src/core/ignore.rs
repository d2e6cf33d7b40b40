//! Ignore rules for extension packaging.
//!
//! Rules are glob patterns with an implicit exclude action, evaluated in
//! declaration order with first-match-wins semantics so that diagnostics can
//! name the rule responsible for skipping a path:
//!
//! - `*` matches within a single path segment, `**` across segments
//! - a pattern without a leading `/` matches at any depth
//! - a leading `/` anchors the pattern to the extension root
//! - a trailing `/` restricts the pattern to directories
//! - a pattern that is not a valid glob is matched literally
//!
//! A path is ignored when it, or any directory above it, matches a rule.

use glob::{MatchOptions, Pattern as GlobPattern};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, warn};

use crate::config::DEFAULT_IGNORE_FILE;
use crate::error::{PackError, Result};

/// Metadata directories that are never packaged
pub const BUILTIN_PATTERNS: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// Always-on exclusion (VCS metadata, the output archive)
    BuiltIn,
    /// A line of the ignore file (1-based)
    IgnoreFile { line: usize },
    /// `extra_ignore` from the configuration file
    Config,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::BuiltIn => write!(f, "built-in"),
            RuleSource::IgnoreFile { line } => write!(f, "ignore file line {}", line),
            RuleSource::Config => write!(f, "config"),
        }
    }
}

/// A single compiled exclude rule
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    /// Pattern as written
    pattern: String,
    source: RuleSource,
    compiled: GlobPattern,
    dir_only: bool,
    /// Set when the pattern was not a valid glob and is matched verbatim
    literal: bool,
}

impl IgnoreRule {
    /// Compile a pattern. Returns `None` for patterns with nothing to match
    /// (empty, or only slashes).
    pub fn new(pattern: &str, source: RuleSource) -> Option<Self> {
        let raw = pattern.trim();
        let dir_only = raw.ends_with('/');
        let anchored = raw.starts_with('/');
        let body = raw.trim_matches('/');
        if body.is_empty() {
            return None;
        }

        let prefix = if anchored { "" } else { "**/" };
        let (compiled, literal) = match GlobPattern::new(&format!("{}{}", prefix, body)) {
            Ok(compiled) => (compiled, false),
            Err(e) => {
                debug!("Pattern '{}' is not a valid glob ({}), matching literally", raw, e);
                let escaped = format!("{}{}", prefix, GlobPattern::escape(body));
                match GlobPattern::new(&escaped) {
                    Ok(compiled) => (compiled, true),
                    Err(e) => {
                        warn!("Dropping unusable ignore pattern '{}': {}", raw, e);
                        return None;
                    }
                }
            }
        };

        Some(Self {
            pattern: raw.to_string(),
            source,
            compiled,
            dir_only,
            literal,
        })
    }

    /// Check this rule against a normalized relative path, then against each
    /// of its ancestor directories
    pub fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.matches_exact(relative_path, is_dir) {
            return true;
        }

        relative_path
            .match_indices('/')
            .any(|(idx, _)| self.matches_exact(&relative_path[..idx], true))
    }

    fn matches_exact(&self, candidate: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        self.compiled.matches_with(candidate, MATCH_OPTIONS)
    }

    /// The pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn source(&self) -> RuleSource {
        self.source
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }
}

/// Ordered collection of exclude rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    rules: Vec<IgnoreRule>,
}

impl IgnoreList {
    /// Create an empty list with no built-in rules
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a list seeded with the built-in VCS exclusions
    pub fn with_builtin() -> Self {
        let mut list = Self::new();
        for pattern in BUILTIN_PATTERNS {
            list.add_pattern(pattern, RuleSource::BuiltIn);
        }
        list
    }

    /// Append a pattern. Unusable patterns are skipped.
    pub fn add_pattern(&mut self, pattern: &str, source: RuleSource) {
        if let Some(rule) = IgnoreRule::new(pattern, source) {
            self.rules.push(rule);
        }
    }

    /// Exclude the archive being written when it lives inside the root
    pub fn exclude_output(&mut self, relative_path: &str) {
        let anchored = format!("/{}", GlobPattern::escape(relative_path));
        self.add_pattern(&anchored, RuleSource::BuiltIn);
    }

    /// Append every pattern of an ignore file. A missing file adds nothing.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No ignore file at {}", path.display());
                return Ok(());
            }
            Err(e) => {
                return Err(PackError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        for (line, pattern) in parse_patterns(&contents) {
            self.add_pattern(&pattern, RuleSource::IgnoreFile { line });
        }
        Ok(())
    }

    /// First rule matching the path, in declaration order
    pub fn first_match(&self, path: &Path, is_dir: bool) -> Option<&IgnoreRule> {
        let normalized = normalize_path(path);
        self.rules.iter().find(|rule| rule.matches(&normalized, is_dir))
    }

    /// Check if a path is excluded
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.first_match(path, is_dir).is_some()
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Split ignore-file contents into `(line number, pattern)` pairs,
/// skipping blank lines and `#` comments
pub fn parse_patterns(contents: &str) -> Vec<(usize, String)> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some((idx + 1, line.to_string()))
            }
        })
        .collect()
}

/// Read the user-declared patterns of the default ignore file under `root`
pub fn load_patterns(root: &Path) -> Result<Vec<String>> {
    let path = root.join(DEFAULT_IGNORE_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(parse_patterns(&contents)
            .into_iter()
            .map(|(_, pattern)| pattern)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(PackError::FileRead { path, source: e }),
    }
}

/// Check a relative file path against a set of patterns plus the built-ins
pub fn matches(relative_path: &str, patterns: &[String]) -> bool {
    let mut list = IgnoreList::with_builtin();
    for pattern in patterns {
        list.add_pattern(pattern, RuleSource::Config);
    }
    list.is_ignored(Path::new(relative_path), false)
}

/// Render a relative path with `/` separators and no `.` segments
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
