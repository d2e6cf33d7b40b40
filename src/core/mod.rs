/*!
 * Core packaging operations: ignore rules, file discovery and hashing
 */

pub mod checksum;
pub mod discovery;
pub mod ignore;

pub use checksum::sha256_hex;
pub use discovery::{discover, discover_with_observer, DiscoveryResult, FileEntry};
pub use ignore::{IgnoreList, IgnoreRule, RuleSource};
