/*!
 * Deterministic archive construction
 *
 * Entries are written in path order with a fixed timestamp and fixed
 * permissions, so the same file set always produces the same bytes.
 */

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::config::{EntryTimestamp, PackConfig, MAX_COMPRESSION_LEVEL};
use crate::core::checksum::sha256_hex;
use crate::core::discovery::FileEntry;
use crate::error::{PackError, Result};

/// Permission bits stored on every entry
const ENTRY_PERMISSIONS: u32 = 0o644;

/// Parameters that influence the archive bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Deflate level 1-9, or 0 to store entries uncompressed
    pub compression_level: u32,
    /// Modification time written to every entry
    pub timestamp: EntryTimestamp,
    /// Re-read the finished archive before returning it
    pub verify: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_level: MAX_COMPRESSION_LEVEL,
            timestamp: EntryTimestamp::default(),
            verify: true,
        }
    }
}

impl ArchiveOptions {
    pub fn from_config(config: &PackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            compression_level: config.compression_level,
            timestamp: config.entry_timestamp()?,
            verify: config.verify_archive,
        })
    }
}

/// A finished archive held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutput {
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`
    pub sha256: String,
    /// Sum of all entry content lengths
    pub unpacked_size: u64,
    pub entry_count: usize,
}

impl ArchiveOutput {
    /// Compressed size in bytes
    pub fn package_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Build an archive from `entries`, which may be in any order
pub fn build(entries: &[FileEntry], options: &ArchiveOptions) -> Result<ArchiveOutput> {
    if options.compression_level > MAX_COMPRESSION_LEVEL {
        return Err(PackError::Config(format!(
            "compression_level must be between 0 and {}, got {}",
            MAX_COMPRESSION_LEVEL, options.compression_level
        )));
    }

    let mut sorted: Vec<&FileEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    check_entry_names(&sorted)?;

    let ts = options.timestamp;
    let modified = DateTime::from_date_and_time(ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second)
        .map_err(|_| PackError::Config(format!("Timestamp {:?} cannot be stored in an archive", ts)))?;

    let file_options = entry_options(options.compression_level)
        .last_modified_time(modified)
        .unix_permissions(ENTRY_PERMISSIONS);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut unpacked_size = 0u64;

    for entry in &sorted {
        writer.start_file(entry.path.as_str(), file_options)?;
        writer.write_all(&entry.contents)?;
        unpacked_size += entry.size();
    }

    let bytes = writer.finish()?.into_inner();
    let output = ArchiveOutput {
        sha256: sha256_hex(&bytes),
        bytes,
        unpacked_size,
        entry_count: sorted.len(),
    };

    debug!(
        entries = output.entry_count,
        unpacked = output.unpacked_size,
        packed = output.package_size(),
        "Archive built"
    );

    if options.verify {
        verify(&output, entries)?;
    }

    Ok(output)
}

/// Deflate accepts levels 1-9; level 0 stores entries uncompressed
fn entry_options(level: u32) -> SimpleFileOptions {
    if level == 0 {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .compression_level(None)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(level as i64))
    }
}

/// Re-open an archive and read every entry back.
///
/// The reader checks each entry's CRC; entry count, names and sizes must
/// match the input set.
pub fn verify(output: &ArchiveOutput, entries: &[FileEntry]) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(output.bytes.as_slice()))?;

    if archive.len() != entries.len() {
        return Err(PackError::Archive(format!(
            "archive holds {} entries, expected {}",
            archive.len(),
            entries.len()
        )));
    }

    let expected: BTreeSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let mut total = 0u64;

    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx)?;
        if !expected.contains(file.name()) {
            return Err(PackError::Archive(format!(
                "unexpected entry '{}' in archive",
                file.name()
            )));
        }
        let read = io::copy(&mut file, &mut io::sink())
            .map_err(|e| PackError::Archive(format!("entry '{}' is corrupt: {}", file.name(), e)))?;
        total += read;
    }

    if total != output.unpacked_size {
        return Err(PackError::Archive(format!(
            "archive unpacks to {} bytes, expected {}",
            total, output.unpacked_size
        )));
    }

    debug!(entries = archive.len(), bytes = total, "Archive verified");
    Ok(())
}

/// Write `bytes` to `path` without ever leaving a partial file behind
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| PackError::Io(e.error))?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Read the entry names of an archive file, in stored order
pub fn list_entries(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path).map_err(|e| PackError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut archive = ZipArchive::new(file)?;
    let mut names = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        names.push(archive.by_index(idx)?.name().to_string());
    }
    Ok(names)
}

/// Read one entry of an archive file
pub fn read_entry(path: &Path, name: &str) -> Result<Vec<u8>> {
    let file = fs::File::open(path).map_err(|e| PackError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(name)?;
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents)?;
    Ok(contents)
}

fn check_entry_names(sorted: &[&FileEntry]) -> Result<()> {
    for (idx, entry) in sorted.iter().enumerate() {
        let path = entry.path.as_str();
        let bad = path.is_empty()
            || path.starts_with('/')
            || path.contains('\\')
            || path.split('/').any(|part| part.is_empty() || part == "." || part == "..");
        if bad {
            return Err(PackError::InvalidEntryName(PathBuf::from(path)));
        }
        if idx > 0 && sorted[idx - 1].path == entry.path {
            return Err(PackError::Archive(format!("duplicate entry '{}'", path)));
        }
    }
    Ok(())
}
