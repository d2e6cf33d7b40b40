/*!
 * File discovery: walk an extension directory and load every file that is
 * not excluded by the ignore rules
 *
 * Symlinks are never followed into directories. A link is packed as a
 * regular file only when it resolves to a file inside the root; links to
 * directories, dangling links and links leaving the root are skipped.
 */

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use super::ignore::{normalize_path, IgnoreList};
use crate::error::{PackError, Result};

/// A file destined for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Root-relative path with `/` separators
    pub path: String,
    /// Raw file contents
    pub contents: Vec<u8>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// Files selected for packaging plus the number of ignored entries
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    files: Vec<FileEntry>,
    ignored_count: usize,
}

impl DiscoveryResult {
    /// Build a result from arbitrary entries; entries are sorted by path
    pub fn new(mut files: Vec<FileEntry>, ignored_count: usize) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            files,
            ignored_count,
        }
    }

    /// Entries sorted by path
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn into_files(self) -> Vec<FileEntry> {
        self.files
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.files
            .binary_search_by(|entry| entry.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|entry| entry.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of all file sizes
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(FileEntry::size).sum()
    }

    /// Files and directories skipped by ignore rules. An ignored directory
    /// counts once; its contents are never visited.
    pub fn ignored_count(&self) -> usize {
        self.ignored_count
    }
}

/// Walk `root` and load every non-ignored regular file
pub fn discover(root: &Path, ignore: &IgnoreList) -> Result<DiscoveryResult> {
    discover_with_observer(root, ignore, &mut |_| {})
}

/// Like [`discover`], calling `observer` with the relative path of every
/// entry the walk visits, before ignore rules are applied. Names that are
/// not UTF-8 are passed lossily.
pub fn discover_with_observer(
    root: &Path,
    ignore: &IgnoreList,
    observer: &mut dyn FnMut(&str),
) -> Result<DiscoveryResult> {
    if !root.exists() {
        return Err(PackError::SourceNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(PackError::NotADirectory(root.to_path_buf()));
    }
    let canonical_root = root.canonicalize()?;

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    let mut files = Vec::new();
    let mut ignored_count = 0usize;

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| walk_error(e, root))?;
        if entry.depth() == 0 {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|_| {
            PackError::Other(format!(
                "{} is outside {}",
                entry.path().display(),
                root.display()
            ))
        })?;
        let display_path = normalize_path(relative);
        observer(&display_path);

        let file_type = entry.file_type();
        let is_dir = file_type.is_dir();

        if let Some(rule) = ignore.first_match(relative, is_dir) {
            debug!(
                path = %display_path,
                pattern = rule.pattern(),
                source = %rule.source(),
                "Ignoring"
            );
            ignored_count += 1;
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        if is_dir {
            continue;
        }

        let read_path = if file_type.is_symlink() {
            match resolve_symlink(entry.path(), &canonical_root) {
                Some(target) if target.is_file() => target,
                Some(_) => {
                    debug!(path = %display_path, "Skipping symlink to a directory");
                    continue;
                }
                None => {
                    debug!(path = %display_path, "Skipping symlink that is dangling or leaves the extension root");
                    continue;
                }
            }
        } else if file_type.is_file() {
            entry.path().to_path_buf()
        } else {
            trace!(path = %display_path, "Skipping special file");
            continue;
        };

        let archive_path = archive_path(relative)?;
        let contents = fs::read(&read_path).map_err(|e| PackError::FileRead {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        trace!(path = %archive_path, bytes = contents.len(), "Read file");
        files.push(FileEntry::new(archive_path, contents));
    }

    debug!(
        files = files.len(),
        ignored = ignored_count,
        "Discovery complete"
    );
    Ok(DiscoveryResult::new(files, ignored_count))
}

/// Convert a relative path into an archive entry name
pub fn archive_path(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PackError::InvalidEntryName(relative.to_path_buf()))?;
                parts.push(normalize_encoding(part));
            }
            Component::CurDir => {}
            _ => return Err(PackError::InvalidEntryName(relative.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}

/// NFC-normalize a name segment so composed and decomposed spellings agree
fn normalize_encoding(part: &str) -> String {
    #[cfg(feature = "unicode-normalization")]
    {
        use unicode_normalization::UnicodeNormalization;
        part.nfc().collect()
    }

    #[cfg(not(feature = "unicode-normalization"))]
    {
        part.to_string()
    }
}

/// Resolve a symlink, keeping it only when its target lies inside the root
fn resolve_symlink(link: &Path, canonical_root: &Path) -> Option<PathBuf> {
    let target = fs::canonicalize(link).ok()?;
    target.starts_with(canonical_root).then_some(target)
}

fn walk_error(err: walkdir::Error, root: &Path) -> PackError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => PackError::FileRead { path, source },
        None => PackError::Other(message),
    }
}
