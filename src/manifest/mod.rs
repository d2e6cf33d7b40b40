//! Extension manifest (`manifest.json`) model and validation.
//!
//! [`check_value`] is the single entry point for the schema: the gating
//! [`validate`] call and the typed [`load`] both go through it, so a manifest
//! that passes one always passes the other.

pub mod schema;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::PackError;

/// One schema violation, addressed by a dotted field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path such as `server.entry_point` or `tools.1.name`;
    /// empty for document-level problems
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Outcome of the gating pre-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<ValidationIssue>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(issues) => issues,
        }
    }
}

/// Errors that can occur while reading a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read manifest '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Manifest is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Manifest validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationIssue>),
}

impl From<ManifestError> for PackError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::NotFound { path } => PackError::ManifestNotFound(path),
            ManifestError::Read { path, source } => PackError::FileRead { path, source },
            ManifestError::Parse(err) => PackError::from(err),
            ManifestError::Invalid(issues) => PackError::ManifestInvalid(issues),
        }
    }
}

/// Parsed extension manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub server: ServerConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_config: BTreeMap<String, UserConfigField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl Manifest {
    /// `name@version`, as shown in report headers
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Entry-point descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_config: Option<McpConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Python,
    Node,
    Binary,
}

impl ServerType {
    pub const ALL: [ServerType; 3] = [ServerType::Python, ServerType::Node, ServerType::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Python => "python",
            ServerType::Node => "node",
            ServerType::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// A user-configurable setting declared by the extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfigField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validate manifest bytes and, on success, return the typed document
pub fn check(bytes: &[u8]) -> Result<Manifest, Vec<ValidationIssue>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| vec![ValidationIssue::new("", format!("Invalid JSON: {}", e))])?;
    check_value(value)
}

/// Schema-check an already parsed document
pub fn check_value(value: Value) -> Result<Manifest, Vec<ValidationIssue>> {
    let issues = schema::validate_value(&value);
    if !issues.is_empty() {
        return Err(issues);
    }

    serde_json::from_value(value).map_err(|e| vec![ValidationIssue::new("", e.to_string())])
}

/// Gating pre-check: pass/fail plus every issue found
pub fn validate_bytes(bytes: &[u8]) -> ValidationResult {
    match check(bytes) {
        Ok(_) => ValidationResult::Valid,
        Err(issues) => ValidationResult::Invalid(issues),
    }
}

/// Read and pre-check a manifest file
pub fn validate(path: &Path) -> Result<ValidationResult, ManifestError> {
    let bytes = read_manifest(path)?;
    Ok(validate_bytes(&bytes))
}

/// Read, validate and parse a manifest file. A syntax error is reported as
/// [`ManifestError::Parse`] rather than as a validation issue.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    let bytes = read_manifest(path)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(ManifestError::Parse)?;
    check_value(value).map_err(ManifestError::Invalid)
}

fn read_manifest(path: &Path) -> Result<Vec<u8>, ManifestError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ManifestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ManifestError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "name": "my-ext",
            "version": "1.2.0",
            "server": { "type": "python", "entry_point": "server/main.py" }
        })
    }

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_minimal_manifest_parses() {
        let manifest = check(&bytes(&minimal())).unwrap();
        assert_eq!(manifest.name, "my-ext");
        assert_eq!(manifest.label(), "my-ext@1.2.0");
        assert_eq!(manifest.server.server_type, ServerType::Python);
        assert!(manifest.user_config.is_empty());
        assert!(manifest.tools.is_empty());
    }

    #[test]
    fn test_full_manifest_parses() {
        let value = json!({
            "name": "mssql",
            "display_name": "SQL Server",
            "version": "0.1.0",
            "description": "Query SQL Server",
            "author": { "name": "Jane Doe", "email": "jane@example.com" },
            "server": {
                "type": "python",
                "entry_point": "server/main.py",
                "mcp_config": {
                    "command": "python",
                    "args": ["${__dirname}/server/main.py"],
                    "env": { "MSSQL_PASSWORD": "${user_config.password}" }
                }
            },
            "user_config": {
                "server_address": { "type": "string", "title": "Server", "required": true },
                "port": { "type": "number", "default": 1433, "min": 1, "max": 65535 },
                "password": { "type": "string", "sensitive": true },
                "auth": {
                    "type": "string",
                    "enum": ["sql_server_authentication", "windows_authentication"],
                    "default": "sql_server_authentication"
                },
                "trust_cert": { "type": "boolean", "default": false }
            },
            "tools": [
                { "name": "execute_query", "description": "Run a query" },
                { "name": "list_tables" }
            ]
        });

        let manifest = check(&bytes(&value)).unwrap();
        assert_eq!(manifest.user_config.len(), 5);
        assert!(manifest.user_config["password"].sensitive);
        assert_eq!(manifest.user_config["port"].field_type, FieldType::Number);
        assert_eq!(manifest.tools[1].name, "list_tables");
        let mcp = manifest.server.mcp_config.unwrap();
        assert_eq!(mcp.command.as_deref(), Some("python"));
        assert_eq!(mcp.env.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_one_issue() {
        let issues = check(b"{ \"name\": ").unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "");
        assert!(issues[0].message.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_validate_and_load_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        std::fs::write(&path, bytes(&minimal())).unwrap();
        assert!(validate(&path).unwrap().is_valid());
        assert!(load(&path).is_ok());

        let mut broken = minimal();
        broken.as_object_mut().unwrap().remove("version");
        std::fs::write(&path, bytes(&broken)).unwrap();
        let result = validate(&path).unwrap();
        assert!(!result.is_valid());
        match load(&path) {
            Err(ManifestError::Invalid(issues)) => assert_eq!(issues, result.issues()),
            other => panic!("expected invalid manifest, got {:?}", other),
        }
    }

    #[test]
    fn test_load_reports_syntax_error_as_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{ \"name\": ").unwrap();

        assert_eq!(validate(&path).unwrap().issues().len(), 1);

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
        let err = PackError::from(err);
        assert!(matches!(err, PackError::ManifestParse(_)));
        assert!(err.to_string().starts_with("Manifest is not valid JSON"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
        assert!(matches!(PackError::from(err), PackError::ManifestNotFound(_)));
    }

    #[test]
    fn test_issue_display() {
        assert_eq!(
            ValidationIssue::new("tools.0.name", "must not be empty").to_string(),
            "tools.0.name: must not be empty"
        );
        assert_eq!(ValidationIssue::new("", "Invalid JSON").to_string(), "Invalid JSON");
    }
}
