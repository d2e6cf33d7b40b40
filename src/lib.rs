/*!
 * dxtpack - desktop extension packager
 *
 * Packs an extension directory into a single deterministic `.dxt` archive:
 * - manifest.json schema validation with field-level issues
 * - .dxtignore glob rules with directory pruning
 * - reproducible Deflate archives with a SHA-256 content hash
 * - grouped, human-readable pack reports
 */

pub mod archive;
pub mod cli_style;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod pack;
pub mod report;

// Re-export commonly used types
pub use archive::{ArchiveOptions, ArchiveOutput};
pub use config::PackConfig;
pub use core::{discover, DiscoveryResult, FileEntry, IgnoreList};
pub use error::{PackError, Result};
pub use manifest::{Manifest, ValidationIssue, ValidationResult};
pub use output::{ConsoleReporter, MemoryReporter, PackResult, Reporter, SilentReporter};
pub use pack::{DecliningInitializer, ManifestInitializer, PackOptions, PackState, Packer};
pub use report::{format_size, sanitize_name, PackReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
