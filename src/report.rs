//! Human-readable pack summary.
//!
//! Everything here is a pure function of the discovered files and the built
//! archive; nothing is persisted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::archive::ArchiveOutput;
use crate::cli_style::Icons;
use crate::config::ARCHIVE_EXTENSION;
use crate::core::discovery::{DiscoveryResult, FileEntry};
use crate::manifest::Manifest;
use crate::output::PackResult;

/// Files nested deeper than this many path segments are grouped
pub const GROUP_DEPTH: usize = 3;

/// Maximum length of a sanitized archive name
pub const MAX_NAME_LEN: usize = 100;

/// Slug used when a name has no file-name-safe characters
pub const FALLBACK_NAME: &str = "extension";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-_.]").unwrap());
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Format a byte count as `B`, `kB` or `MB`
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * KB;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}kB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}

/// Turn a manifest name into a file-name-safe slug
pub fn sanitize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let hyphenated = WHITESPACE.replace_all(lower.trim(), "-");
    let stripped = DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = HYPHENS.replace_all(&stripped, "-");

    let truncated: String = collapsed.trim_matches('-').chars().take(MAX_NAME_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Canonical archive file name: `<sanitized name>-<version>.dxt`
pub fn archive_filename(name: &str, version: &str) -> String {
    format!("{}-{}.{}", slug_or_fallback(name), version, ARCHIVE_EXTENSION)
}

/// [`sanitize_name`], or [`FALLBACK_NAME`] when nothing survives
pub fn slug_or_fallback(name: &str) -> String {
    match sanitize_name(name) {
        slug if slug.is_empty() => FALLBACK_NAME.to_string(),
        slug => slug,
    }
}

/// One line of the "Archive Contents" listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    File { path: String, size: u64 },
    Group { prefix: String, count: usize, size: u64 },
}

impl ReportEntry {
    pub fn size(&self) -> u64 {
        match self {
            ReportEntry::File { size, .. } | ReportEntry::Group { size, .. } => *size,
        }
    }

    fn render(&self) -> String {
        match self {
            ReportEntry::File { path, size } => format!("{:>8} {}", format_size(*size), path),
            ReportEntry::Group {
                prefix,
                count,
                size,
            } => format!(
                "{:>8} {}/ [and {} more files]",
                format_size(*size),
                prefix,
                count
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct GroupTotals<'a> {
    count: usize,
    size: u64,
    first: &'a str,
}

/// Key a file is listed under: its own path, or its first three segments
fn group_key(path: &str) -> &str {
    match path.match_indices('/').nth(GROUP_DEPTH - 1) {
        Some((idx, _)) => &path[..idx],
        None => path,
    }
}

/// Collapse deep files into per-prefix groups. Output is sorted by key.
pub fn group_entries(files: &[FileEntry]) -> Vec<ReportEntry> {
    let totals = files
        .iter()
        .fold(BTreeMap::<&str, GroupTotals>::new(), |mut acc, file| {
            let slot = acc.entry(group_key(&file.path)).or_default();
            if slot.count == 0 || file.path.as_str() < slot.first {
                slot.first = file.path.as_str();
            }
            slot.count += 1;
            slot.size += file.size();
            acc
        });

    totals
        .into_iter()
        .map(|(key, totals)| {
            if totals.count == 1 {
                ReportEntry::File {
                    path: totals.first.to_string(),
                    size: totals.size,
                }
            } else {
                ReportEntry::Group {
                    prefix: key.to_string(),
                    count: totals.count,
                    size: totals.size,
                }
            }
        })
        .collect()
}

/// Display model for one successful pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub name: String,
    pub version: String,
    /// Sanitized canonical file name
    pub filename: String,
    /// Where the archive was actually written
    pub output: PathBuf,
    pub entries: Vec<ReportEntry>,
    pub package_size: u64,
    pub unpacked_size: u64,
    pub sha256: String,
    pub total_files: usize,
    pub ignored_files: usize,
}

/// Build the report for a finished archive
pub fn format(
    manifest: &Manifest,
    discovery: &DiscoveryResult,
    archive: &ArchiveOutput,
    output: &Path,
) -> PackReport {
    PackReport {
        name: manifest.name.clone(),
        version: manifest.version.clone(),
        filename: archive_filename(&manifest.name, &manifest.version),
        output: output.to_path_buf(),
        entries: group_entries(discovery.files()),
        package_size: archive.package_size(),
        unpacked_size: archive.unpacked_size,
        sha256: archive.sha256.clone(),
        total_files: discovery.len(),
        ignored_files: discovery.ignored_count(),
    }
}

impl PackReport {
    /// Line-oriented rendering for the console
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{}  {}@{}", Icons::PACKAGE, self.name, self.version),
            "Archive Contents".to_string(),
        ];
        lines.extend(self.entries.iter().map(ReportEntry::render));
        lines.extend([
            String::new(),
            "Archive Details".to_string(),
            format!("name: {}", self.name),
            format!("version: {}", self.version),
            format!("filename: {}", self.filename),
            format!("package size: {}", format_size(self.package_size)),
            format!("unpacked size: {}", format_size(self.unpacked_size)),
            format!("shasum: {}", self.sha256),
            format!("total files: {}", self.total_files),
            format!("ignored files: {}", self.ignored_files),
            String::new(),
            format!("Output: {}", self.output.display()),
        ]);
        lines
    }

    /// Structured form for JSON output
    pub fn to_result(&self) -> PackResult {
        PackResult {
            success: true,
            name: Some(self.name.clone()),
            version: Some(self.version.clone()),
            filename: Some(self.filename.clone()),
            output: Some(self.output.display().to_string()),
            package_size: Some(self.package_size),
            unpacked_size: Some(self.unpacked_size),
            sha256: Some(self.sha256.clone()),
            total_files: Some(self.total_files),
            ignored_files: Some(self.ignored_files),
            ..PackResult::default()
        }
    }
}
