//! Report surface for pack operations.
//!
//! Pipeline code never prints directly. It receives a [`Reporter`] and
//! writes its user-facing lines through it, which lets the CLI choose
//! between human output, a single JSON document, or nothing at all.

use serde::Serialize;
use std::cell::RefCell;

use crate::cli_style::{Icons, Theme};

/// Capability handed to every pipeline stage that talks to the user
pub trait Reporter {
    /// A normal report line
    fn log(&self, line: &str);

    /// A diagnostic line describing a failure
    fn error(&self, line: &str);

    /// Relative path of an entry discovery is about to consider
    fn visit(&self, _path: &str) {}

    /// Called once with the final outcome of a pack invocation
    fn finish(&self, _result: &PackResult) {}
}

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Structured pack outcome for JSON output
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PackResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpacked_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Reporter writing to the terminal
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    pub mode: OutputMode,
}

impl ConsoleReporter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
}

impl Reporter for ConsoleReporter {
    fn log(&self, line: &str) {
        if !self.is_json() {
            println!("{}", line);
        }
    }

    fn error(&self, line: &str) {
        if !self.is_json() {
            eprintln!("{} {}", Theme::error(Icons::ERROR), line);
        }
    }

    fn finish(&self, result: &PackResult) {
        if self.is_json() {
            if let Ok(json) = serde_json::to_string(result) {
                println!("{}", json);
            }
        }
    }
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn log(&self, _line: &str) {}

    fn error(&self, _line: &str) {}
}

/// Reporter that keeps every line in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
    result: RefCell<Option<PackResult>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines passed to `log`, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Lines passed to `error`, in order
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    /// The outcome passed to `finish`, if any
    pub fn result(&self) -> Option<PackResult> {
        self.result.borrow().clone()
    }

    /// All `log` lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl Reporter for MemoryReporter {
    fn log(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }

    fn error(&self, line: &str) {
        self.errors.borrow_mut().push(line.to_string());
    }

    fn finish(&self, result: &PackResult) {
        *self.result.borrow_mut() = Some(result.clone());
    }
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}
