/*!
 * Pack orchestration
 *
 * Runs the pipeline for one extension directory:
 * manifest check, manifest validation, discovery, archive build, report
 * and write. Any failure moves the packer to `Failed`; the archive is only
 * written once the complete buffer exists in memory.
 */

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveOptions};
use crate::config::{PackConfig, ARCHIVE_EXTENSION, MANIFEST_FILE};
use crate::core::discovery::{self, DiscoveryResult};
use crate::core::ignore::{normalize_path, IgnoreList, RuleSource};
use crate::error::{ErrorCategory, PackError, Result};
use crate::manifest::{self, Manifest};
use crate::output::{sanitize_error, PackResult, Reporter};
use crate::report::{self, PackReport};

/// Pipeline position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackState {
    Idle,
    ManifestCheck,
    ManifestValidate,
    Discover,
    Build,
    Report,
    Done,
    Failed,
}

impl fmt::Display for PackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackState::Idle => "idle",
            PackState::ManifestCheck => "manifest-check",
            PackState::ManifestValidate => "manifest-validate",
            PackState::Discover => "discover",
            PackState::Build => "build",
            PackState::Report => "report",
            PackState::Done => "done",
            PackState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Creates a manifest when the extension directory has none
pub trait ManifestInitializer {
    /// Offer to create `manifest.json` in `dir`.
    ///
    /// Returns `Ok(true)` once a manifest was written, `Ok(false)` when the
    /// user declined.
    fn create_manifest(&self, dir: &Path, reporter: &dyn Reporter) -> Result<bool>;
}

/// Initializer for non-interactive runs
#[derive(Debug, Clone, Copy, Default)]
pub struct DecliningInitializer;

impl ManifestInitializer for DecliningInitializer {
    fn create_manifest(&self, _dir: &Path, _reporter: &dyn Reporter) -> Result<bool> {
        Ok(false)
    }
}

/// Input for one pack invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    /// Extension root
    pub dir: PathBuf,
    /// Archive path; defaults to `<dir name>.dxt` in the working directory
    pub output: Option<PathBuf>,
}

impl PackOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Outcome of a successful pack
#[derive(Debug, Clone)]
pub struct PackSummary {
    pub manifest: Manifest,
    pub report: PackReport,
}

/// Sequences the pipeline and reports through an explicit [`Reporter`]
pub struct Packer<'a> {
    config: &'a PackConfig,
    reporter: &'a dyn Reporter,
    initializer: &'a dyn ManifestInitializer,
    state: PackState,
}

impl<'a> Packer<'a> {
    pub fn new(
        config: &'a PackConfig,
        reporter: &'a dyn Reporter,
        initializer: &'a dyn ManifestInitializer,
    ) -> Self {
        Self {
            config,
            reporter,
            initializer,
            state: PackState::Idle,
        }
    }

    pub fn state(&self) -> PackState {
        self.state
    }

    /// Run the pipeline, returning `true` on success.
    ///
    /// Failures are reported through the reporter before returning.
    pub fn pack(&mut self, options: &PackOptions) -> bool {
        match self.try_pack(options) {
            Ok(summary) => {
                self.reporter.finish(&summary.report.to_result());
                true
            }
            Err(err) => {
                let message = describe_failure(&err);
                self.reporter.error(&message);
                self.reporter.finish(&PackResult {
                    success: false,
                    error: Some(sanitize_error(&message)),
                    issues: err.issues().iter().map(ToString::to_string).collect(),
                    ..PackResult::default()
                });
                false
            }
        }
    }

    /// Run the pipeline, returning the summary or the first error
    pub fn try_pack(&mut self, options: &PackOptions) -> Result<PackSummary> {
        self.state = PackState::Idle;
        let result = self.run(options);
        if result.is_err() {
            self.transition(PackState::Failed);
        }
        result
    }

    fn run(&mut self, options: &PackOptions) -> Result<PackSummary> {
        let root = options.dir.as_path();

        self.transition(PackState::ManifestCheck);
        let manifest_path = self.ensure_manifest(root)?;

        self.transition(PackState::ManifestValidate);
        let manifest = manifest::load(&manifest_path)?;
        info!("Packing {}", manifest.label());

        self.transition(PackState::Discover);
        let output_path = resolve_output(root, options.output.as_deref())?;
        let ignore = self.ignore_rules(root, &output_path)?;
        let reporter = self.reporter;
        let discovered =
            discovery::discover_with_observer(root, &ignore, &mut |path| reporter.visit(path))?;
        info!(
            files = discovered.len(),
            ignored = discovered.ignored_count(),
            "Discovered files"
        );

        self.transition(PackState::Build);
        let archive_options = ArchiveOptions::from_config(self.config)?;
        let built = archive::build(discovered.files(), &archive_options)?;

        self.transition(PackState::Report);
        let report = report::format(&manifest, &discovered, &built, &output_path);
        archive::write_atomic(&output_path, &built.bytes)?;
        self.emit(&report, &discovered);

        self.transition(PackState::Done);
        Ok(PackSummary { manifest, report })
    }

    fn transition(&mut self, next: PackState) {
        debug!(from = %self.state, to = %next, "Pack state");
        self.state = next;
    }

    /// Locate `manifest.json`, offering to create one when it is missing
    fn ensure_manifest(&self, root: &Path) -> Result<PathBuf> {
        if !root.exists() {
            return Err(PackError::SourceNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(PackError::NotADirectory(root.to_path_buf()));
        }

        let manifest_path = root.join(MANIFEST_FILE);
        if manifest_path.is_file() {
            return Ok(manifest_path);
        }

        self.reporter
            .log(&format!("No {} found in {}", MANIFEST_FILE, root.display()));
        if !self.initializer.create_manifest(root, self.reporter)? {
            return Err(PackError::ManifestDeclined);
        }
        if !manifest_path.is_file() {
            return Err(PackError::ManifestNotFound(manifest_path));
        }
        Ok(manifest_path)
    }

    /// Built-ins, then the ignore file, then configured extras
    fn ignore_rules(&self, root: &Path, output: &Path) -> Result<IgnoreList> {
        let mut ignore = IgnoreList::with_builtin();
        if let Some(relative) = output_within(root, output) {
            debug!(path = %relative, "Excluding output archive");
            ignore.exclude_output(&relative);
        }
        ignore.load_from_file(root.join(&self.config.ignore_file))?;
        for pattern in &self.config.extra_ignore {
            ignore.add_pattern(pattern, RuleSource::Config);
        }
        debug!(rules = ignore.len(), "Ignore rules loaded");
        Ok(ignore)
    }

    fn emit(&self, report: &PackReport, discovered: &DiscoveryResult) {
        if discovered.is_empty() {
            warn!("No files to pack");
        }
        for line in report.render() {
            self.reporter.log(&line);
        }
    }
}

/// Default archive path: `<dir name>.dxt` in the working directory
pub fn default_output(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize()?;
    let stem = canonical
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("extension");
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(format!("{}.{}", stem, ARCHIVE_EXTENSION)))
}

fn resolve_output(root: &Path, output: Option<&Path>) -> Result<PathBuf> {
    match output {
        Some(path) if path.is_absolute() => Ok(path.to_path_buf()),
        Some(path) => Ok(std::env::current_dir()?.join(path)),
        None => default_output(root),
    }
}

/// Root-relative path of `output` when it lies inside `root`
fn output_within(root: &Path, output: &Path) -> Option<String> {
    let root = root.canonicalize().ok()?;
    let file_name = output.file_name()?;
    let parent = output.parent()?.canonicalize().ok()?;
    let relative = parent.join(file_name).strip_prefix(&root).ok()?.to_path_buf();
    Some(normalize_path(&relative))
}

fn describe_failure(err: &PackError) -> String {
    match err.category() {
        ErrorCategory::Unknown => format!("Unexpected error while packing: {}", err),
        _ => err.to_string(),
    }
}
